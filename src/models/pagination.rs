use serde::{Deserialize, Serialize};

use crate::config::FeedConfig;
use crate::error::{AppError, AppResult};

/// Raw `?page=&page_size=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Pages are 1-based. Absent or zero sizes fall back to the default,
    /// oversized ones clamp to the maximum.
    pub fn resolve(&self, limits: &FeedConfig) -> AppResult<PageWindow> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        let page_size = match self.page_size {
            None | Some(0) => limits.default_page_size,
            Some(size) => size.min(limits.max_page_size),
        };
        Ok(PageWindow { page, page_size })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub fn into_page<T>(self, count: u64, results: Vec<T>) -> Page<T> {
        let has_next = (self.offset() as u64).saturating_add(results.len() as u64) < count;
        Page {
            count,
            page: self.page,
            page_size: self.page_size,
            has_next,
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub results: Vec<T>,
}
