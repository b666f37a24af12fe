// Auth tokens - opaque keys mapping a request to a registered user
// Credential checks and token rotation live with the external auth service;
// this store only issues a key on registration and resolves keys.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

use crate::core::{current_time_millis, UserId};
use crate::error::AppResult;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::database::SocialDatabase;

#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Return the user's token, creating one on first use
    async fn issue(&self, user: UserId) -> AppResult<String>;

    /// Resolve a presented key; `None` for unknown keys
    async fn resolve(&self, token: &str) -> AppResult<Option<UserId>>;
}

/// SQLite-backed tokens with an LRU in front of the lookup
pub struct SqliteTokenIssuer {
    db: Arc<SocialDatabase>,
    cache: Mutex<Cache<String, UserId>>,
}

impl SqliteTokenIssuer {
    pub fn new(db: Arc<SocialDatabase>, cache_capacity: usize) -> Self {
        Self {
            db,
            cache: Mutex::new(Cache::new(cache_capacity)),
        }
    }

    fn cached(&self, token: &str) -> Option<UserId> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&token.to_string())
    }

    fn remember(&self, token: String, user: UserId) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, user);
    }
}

#[async_trait]
impl TokenIssuer for SqliteTokenIssuer {
    async fn issue(&self, user: UserId) -> AppResult<String> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT token FROM auth_tokens WHERE user_id = ? LIMIT 1")
                .bind(user)
                .fetch_optional(&self.db.pool)
                .await?;
        if let Some(token) = existing {
            return Ok(token);
        }

        let token = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user)
            .bind(current_time_millis())
            .execute(&self.db.pool)
            .await?;

        debug!(user_id = %user, "issued auth token");
        self.remember(token.clone(), user);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> AppResult<Option<UserId>> {
        if let Some(user) = self.cached(token) {
            return Ok(Some(user));
        }

        let user: Option<UserId> =
            sqlx::query_scalar("SELECT user_id FROM auth_tokens WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.db.pool)
                .await?;
        if let Some(user) = user {
            self.remember(token.to_string(), user);
        }
        Ok(user)
    }
}
