// User Directory - identities, profiles and the directed follow graph

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{current_time_millis, TargetKind, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{is_check_violation, is_foreign_key_violation, SocialDatabase};
use crate::models::{
    NewNotification, NewUser, NotificationTarget, ProfileUpdate, User, UserProfile, VERB_FOLLOWED,
};
use crate::services::notification_log::NotificationLog;

const USER_COLUMNS: &str = "id, username, email, bio, avatar, created_at";

/// Result of a follow request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
}

pub struct UserDirectory {
    db: Arc<SocialDatabase>,
    notifications: Arc<NotificationLog>,
}

impl UserDirectory {
    pub fn new(db: Arc<SocialDatabase>, notifications: Arc<NotificationLog>) -> Self {
        Self { db, notifications }
    }

    pub async fn register(&self, new_user: NewUser) -> AppResult<User> {
        let errors = new_user.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(", ")));
        }

        let id = UserId::new(self.db.next_id());
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, bio, avatar, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.bio)
        .bind(&new_user.avatar)
        .bind(current_time_millis())
        .execute(&self.db.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyExists(format!(
                "A user with username {} already exists",
                new_user.username
            )));
        }

        info!(user_id = %id, username = %new_user.username, "user registered");
        self.get(id).await
    }

    pub async fn find(&self, id: UserId) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: UserId) -> AppResult<User> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<User> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    pub async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> AppResult<User> {
        let errors = update.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(", ")));
        }

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE(?, email),
                bio = COALESCE(?, bio),
                avatar = COALESCE(?, avatar)
            WHERE id = ?
            "#,
        )
        .bind(&update.email)
        .bind(&update.bio)
        .bind(&update.avatar)
        .bind(id)
        .execute(&self.db.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        info!(user_id = %id, "profile updated");
        self.get(id).await
    }

    pub async fn profile(&self, id: UserId) -> AppResult<UserProfile> {
        let user = self.get(id).await?;
        Ok(UserProfile {
            followers_count: self.follower_count(id).await?,
            following_count: self.following_count(id).await?,
            user,
        })
    }

    /// Creates the follower → target edge. Repeating a follow is a no-op and
    /// does not notify again.
    pub async fn follow(&self, follower: UserId, target: UserId) -> AppResult<FollowOutcome> {
        if follower == target {
            return Err(AppError::SelfReference("You cannot follow yourself".to_string()));
        }
        self.get(target).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, target_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(follower_id, target_id) DO NOTHING
            "#,
        )
        .bind(follower)
        .bind(target)
        .bind(current_time_millis())
        .execute(&self.db.pool)
        .await
        .map_err(|e| {
            if is_check_violation(&e) {
                AppError::SelfReference("You cannot follow yourself".to_string())
            } else if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("User {} not found", target))
            } else {
                AppError::from(e)
            }
        })?;

        if result.rows_affected() == 0 {
            debug!(follower = %follower, target = %target, "follow already present");
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        info!(follower = %follower, target = %target, "follow created");
        self.notifications
            .notify(
                NewNotification::new(target, follower, VERB_FOLLOWED)
                    .with_target(NotificationTarget::new(TargetKind::User, follower)),
            )
            .await;
        Ok(FollowOutcome::Followed)
    }

    /// Removing an absent edge is not an error; an unknown target is.
    pub async fn unfollow(&self, follower: UserId, target: UserId) -> AppResult<bool> {
        self.get(target).await?;

        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND target_id = ?")
            .bind(follower)
            .bind(target)
            .execute(&self.db.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!(follower = %follower, target = %target, "follow removed");
        }
        Ok(removed)
    }

    pub async fn is_following(&self, follower: UserId, target: UserId) -> AppResult<bool> {
        let row: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM follows WHERE follower_id = ? AND target_id = ?")
                .bind(follower)
                .bind(target)
                .fetch_optional(&self.db.pool)
                .await?;
        Ok(row.is_some())
    }

    pub async fn followers_of(&self, user: UserId) -> AppResult<HashSet<UserId>> {
        let ids: Vec<UserId> =
            sqlx::query_scalar("SELECT follower_id FROM follows WHERE target_id = ?")
                .bind(user)
                .fetch_all(&self.db.pool)
                .await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn following_of(&self, user: UserId) -> AppResult<HashSet<UserId>> {
        let ids: Vec<UserId> =
            sqlx::query_scalar("SELECT target_id FROM follows WHERE follower_id = ?")
                .bind(user)
                .fetch_all(&self.db.pool)
                .await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn follower_count(&self, user: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE target_id = ?")
            .bind(user)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn following_count(&self, user: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{register, Fixture};

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let fx = Fixture::new().await;
        register(&fx, "alice").await;

        let err = fx
            .users
            .register(NewUser {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        let err = fx
            .users
            .register(NewUser {
                username: "bad name".to_string(),
                email: "x@example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_follow_populates_both_directions() {
        let fx = Fixture::new().await;
        let a = register(&fx, "a").await;
        let b = register(&fx, "b").await;

        assert_eq!(fx.users.follow(a.id, b.id).await.unwrap(), FollowOutcome::Followed);

        assert!(fx.users.following_of(a.id).await.unwrap().contains(&b.id));
        assert!(fx.users.followers_of(b.id).await.unwrap().contains(&a.id));
        // Not symmetric.
        assert!(fx.users.following_of(b.id).await.unwrap().is_empty());

        let profile = fx.users.profile(b.id).await.unwrap();
        assert_eq!(profile.followers_count, 1);
        assert_eq!(profile.following_count, 0);
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let fx = Fixture::new().await;
        let a = register(&fx, "a").await;

        let err = fx.users.follow(a.id, a.id).await.unwrap_err();
        assert!(matches!(err, AppError::SelfReference(_)));
        assert!(fx.users.following_of(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_follow_is_silent_no_op() {
        let fx = Fixture::new().await;
        let a = register(&fx, "a").await;
        let b = register(&fx, "b").await;

        fx.users.follow(a.id, b.id).await.unwrap();
        assert_eq!(
            fx.users.follow(a.id, b.id).await.unwrap(),
            FollowOutcome::AlreadyFollowing
        );

        assert_eq!(fx.users.follower_count(b.id).await.unwrap(), 1);
        let notes = fx.notifications.list_for(b.id).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].verb, VERB_FOLLOWED);
        assert_eq!(notes[0].actor, a.id);
    }

    #[tokio::test]
    async fn test_unfollow_is_idempotent() {
        let fx = Fixture::new().await;
        let a = register(&fx, "a").await;
        let b = register(&fx, "b").await;

        assert!(!fx.users.unfollow(a.id, b.id).await.unwrap());
        fx.users.follow(a.id, b.id).await.unwrap();
        assert!(fx.users.unfollow(a.id, b.id).await.unwrap());
        assert!(!fx.users.is_following(a.id, b.id).await.unwrap());

        let err = fx.users.unfollow(a.id, UserId::new(404)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let fx = Fixture::new().await;
        let a = register(&fx, "a").await;
        let err = fx.users.follow(a.id, UserId::new(404)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_absent_fields() {
        let fx = Fixture::new().await;
        let a = register(&fx, "a").await;

        let updated = fx
            .users
            .update_profile(
                a.id,
                ProfileUpdate {
                    bio: Some("hi there".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("hi there"));
        assert_eq!(updated.email, a.email);
        assert_eq!(fx.users.get_by_username("a").await.unwrap().id, a.id);
    }
}
