use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use crate::core::{millis_to_datetime, UserId};

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]{1,150}$").expect("username pattern is valid"));
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

const MAX_BIO_LENGTH: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub date_joined: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for User {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            bio: row.try_get("bio")?,
            avatar: row.try_get("avatar")?,
            date_joined: millis_to_datetime(row.try_get("created_at")?),
        })
    }
}

/// A user together with follow-graph counts, as shown on profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub followers_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !USERNAME_PATTERN.is_match(&self.username) {
            errors.push(
                "username must be 1-150 letters, digits or @/./+/-/_ characters".to_string(),
            );
        }
        if !EMAIL_PATTERN.is_match(&self.email) {
            errors.push("email must be a valid address".to_string());
        }
        if let Some(bio) = &self.bio {
            validate_bio(bio, &mut errors);
        }
        errors
    }
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(email) = &self.email {
            if !EMAIL_PATTERN.is_match(email) {
                errors.push("email must be a valid address".to_string());
            }
        }
        if let Some(bio) = &self.bio {
            validate_bio(bio, &mut errors);
        }
        errors
    }
}

fn validate_bio(bio: &str, errors: &mut Vec<String>) {
    if bio.chars().count() > MAX_BIO_LENGTH {
        errors.push(format!("bio must be at most {} characters", MAX_BIO_LENGTH));
    }
}
