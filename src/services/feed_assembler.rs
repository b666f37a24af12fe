// Feed Assembler - reverse-chronological posts from followed users

use std::sync::Arc;
use tracing::debug;

use crate::config::FeedConfig;
use crate::core::UserId;
use crate::error::AppResult;
use crate::infrastructure::database::SocialDatabase;
use crate::models::{Page, PageRequest, Post};
use crate::services::post_store::POST_SELECT;

pub struct FeedAssembler {
    db: Arc<SocialDatabase>,
    limits: FeedConfig,
}

impl FeedAssembler {
    pub fn new(db: Arc<SocialDatabase>, limits: FeedConfig) -> Self {
        Self { db, limits }
    }

    /// Offset pagination: page N holds items [(N-1)*size, N*size). Following
    /// nobody, or paging past the end, gives an empty page.
    pub async fn feed_for(&self, user: UserId, request: PageRequest) -> AppResult<Page<Post>> {
        let window = request.resolve(&self.limits)?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM posts p
            JOIN follows f ON f.target_id = p.author_id
            WHERE f.follower_id = ?
            "#,
        )
        .bind(user)
        .fetch_one(&self.db.pool)
        .await?;

        let sql = format!(
            r#"{}
            JOIN follows f ON f.target_id = p.author_id
            WHERE f.follower_id = ?
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ? OFFSET ?"#,
            POST_SELECT
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(user)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.db.pool)
            .await?;

        debug!(user = %user, page = window.page, page_size = window.page_size, total = count, "feed assembled");
        Ok(window.into_page(count.max(0) as u64, posts))
    }
}
