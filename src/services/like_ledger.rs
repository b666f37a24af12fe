// Like Ledger - at most one like per (user, post)
//
// Uniqueness is the table's primary key: the insert either lands or touches
// zero rows, so two racing likes for the same pair yield exactly one winner.

use std::sync::Arc;
use tracing::info;

use crate::core::{current_time_millis, millis_to_datetime, PostId, TargetKind, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{is_foreign_key_violation, SocialDatabase};
use crate::models::{Like, NewNotification, NotificationTarget, Post, VERB_LIKED};
use crate::services::notification_log::NotificationLog;

pub struct LikeLedger {
    db: Arc<SocialDatabase>,
    notifications: Arc<NotificationLog>,
}

impl LikeLedger {
    pub fn new(db: Arc<SocialDatabase>, notifications: Arc<NotificationLog>) -> Self {
        Self { db, notifications }
    }

    /// Records the like and tells the post's author, unless the author is
    /// the one liking.
    pub async fn like(&self, user: UserId, post: &Post) -> AppResult<Like> {
        let now = current_time_millis();
        let result = sqlx::query(
            r#"
            INSERT INTO likes (user_id, post_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, post_id) DO NOTHING
            "#,
        )
        .bind(user)
        .bind(post.id)
        .bind(now)
        .execute(&self.db.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("Post {} not found", post.id))
            } else {
                AppError::from(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyExists("You have already liked this post".to_string()));
        }

        info!(user = %user, post_id = %post.id, "post liked");
        if post.author != user {
            self.notifications
                .notify(
                    NewNotification::new(post.author, user, VERB_LIKED)
                        .with_target(NotificationTarget::new(TargetKind::Post, post.id)),
                )
                .await;
        }

        Ok(Like {
            user,
            post: post.id,
            created_at: millis_to_datetime(now),
        })
    }

    pub async fn unlike(&self, user: UserId, post: &Post) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user)
            .bind(post.id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("You have not liked this post".to_string()));
        }
        info!(user = %user, post_id = %post.id, "post unliked");
        Ok(())
    }

    pub async fn has_liked(&self, user: UserId, post: PostId) -> AppResult<bool> {
        let row: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM likes WHERE user_id = ? AND post_id = ?")
                .bind(user)
                .bind(post)
                .fetch_optional(&self.db.pool)
                .await?;
        Ok(row.is_some())
    }

    pub async fn like_count(&self, post: PostId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{post_by, register, Fixture};

    #[tokio::test]
    async fn test_double_like_fails_and_keeps_one_entry() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;
        let bob = register(&fx, "bob").await;
        let post = post_by(&fx, &alice, "likeable").await;

        let like = fx.likes.like(bob.id, &post).await.unwrap();
        assert_eq!(like.user, bob.id);
        assert_eq!(like.post, post.id);

        let err = fx.likes.like(bob.id, &post).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
        assert_eq!(fx.likes.like_count(post.id).await.unwrap(), 1);
        assert!(fx.likes.has_liked(bob.id, post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlike_without_like() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;
        let post = post_by(&fx, &alice, "lonely").await;

        let err = fx.likes.unlike(alice.id, &post).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        fx.likes.like(alice.id, &post).await.unwrap();
        fx.likes.unlike(alice.id, &post).await.unwrap();
        assert!(!fx.likes.has_liked(alice.id, post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_like_notifies_author_once() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;
        let bob = register(&fx, "bob").await;
        let post = post_by(&fx, &alice, "notify me").await;

        fx.likes.like(bob.id, &post).await.unwrap();

        let notes = fx.notifications.list_for(alice.id).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].verb, VERB_LIKED);
        assert_eq!(notes[0].actor, bob.id);
        assert_eq!(
            notes[0].target,
            Some(NotificationTarget::new(TargetKind::Post, post.id))
        );
    }

    #[tokio::test]
    async fn test_self_like_is_silent() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;
        let post = post_by(&fx, &alice, "mine").await;

        fx.likes.like(alice.id, &post).await.unwrap();
        assert!(fx.notifications.list_for(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_like_deleted_post() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;
        let post = post_by(&fx, &alice, "gone").await;
        fx.posts.delete_post(post.id).await.unwrap();

        let err = fx.likes.like(alice.id, &post).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
