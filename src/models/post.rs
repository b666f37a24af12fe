use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use crate::core::{millis_to_datetime, CommentId, PostId, UserId};

const MAX_TITLE_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments_count: u64,
    pub likes_count: u64,
}

impl FromRow<'_, SqliteRow> for Post {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            author: row.try_get("author_id")?,
            author_username: row.try_get("author_username")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            created_at: millis_to_datetime(row.try_get("created_at")?),
            updated_at: millis_to_datetime(row.try_get("updated_at")?),
            comments_count: row.try_get::<i64, _>("comments_count")?.max(0) as u64,
            likes_count: row.try_get::<i64, _>("likes_count")?.max(0) as u64,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post: PostId,
    pub author: UserId,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for Comment {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            post: row.try_get("post_id")?,
            author: row.try_get("author_id")?,
            author_username: row.try_get("author_username")?,
            content: row.try_get("content")?,
            created_at: millis_to_datetime(row.try_get("created_at")?),
            updated_at: millis_to_datetime(row.try_get("updated_at")?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub user: UserId,
    pub post: PostId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

impl NewPost {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_title(&self.title, &mut errors);
        validate_body("content", &self.content, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostUpdate {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            validate_title(title, &mut errors);
        }
        if let Some(content) = &self.content {
            validate_body("content", content, &mut errors);
        }
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub post: PostId,
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_body("content", &self.content, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentUpdate {
    pub content: String,
}

impl CommentUpdate {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_body("content", &self.content, &mut errors);
        errors
    }
}

fn validate_title(title: &str, errors: &mut Vec<String>) {
    if title.trim().is_empty() {
        errors.push("title is required".to_string());
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.push(format!("title must be at most {} characters", MAX_TITLE_LENGTH));
    }
}

fn validate_body(field: &str, value: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{} is required", field));
    }
}
