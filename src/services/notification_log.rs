// Notification Log - append-only events directed at a user

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::{current_time_millis, NotificationId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{is_foreign_key_violation, SocialDatabase};
use crate::models::{NewNotification, Notification};

const NOTIFICATION_SELECT: &str = r#"
    SELECT n.id, n.recipient_id, n.actor_id, u.username AS actor_username, n.verb,
           n.target_kind, n.target_id, n.created_at, n.is_read
    FROM notifications n
    JOIN users u ON u.id = n.actor_id
"#;

pub struct NotificationLog {
    db: Arc<SocialDatabase>,
}

impl NotificationLog {
    pub fn new(db: Arc<SocialDatabase>) -> Self {
        Self { db }
    }

    /// Append an unread entry. The recipient must exist.
    pub async fn record(&self, event: NewNotification) -> AppResult<Notification> {
        let id = NotificationId::new(self.db.next_id());
        let (target_kind, target_id) = match event.target {
            Some(target) => (Some(target.kind.as_str()), Some(target.id)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, recipient_id, actor_id, verb, target_kind, target_id, created_at, is_read)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(id)
        .bind(event.recipient)
        .bind(event.actor)
        .bind(&event.verb)
        .bind(target_kind)
        .bind(target_id)
        .bind(current_time_millis())
        .execute(&self.db.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound(format!(
                    "Recipient {} or actor {} does not exist",
                    event.recipient, event.actor
                ))
            } else {
                AppError::from(e)
            }
        })?;

        debug!(notification_id = %id, recipient = %event.recipient, verb = %event.verb, "notification recorded");
        self.fetch(id, event.recipient)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Notification {} vanished after insert", id)))
    }

    /// Side-channel write for interaction handlers. A failure is logged and
    /// swallowed so the triggering mutation stands.
    pub async fn notify(&self, event: NewNotification) -> Option<Notification> {
        let recipient = event.recipient;
        let verb = event.verb.clone();
        match self.record(event).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!(recipient = %recipient, verb = %verb, error = %e, "failed to record notification");
                None
            }
        }
    }

    /// Newest first, read and unread alike
    pub async fn list_for(&self, recipient: UserId) -> AppResult<Vec<Notification>> {
        let sql = format!("{} WHERE n.recipient_id = ? ORDER BY n.id DESC", NOTIFICATION_SELECT);
        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(recipient)
            .fetch_all(&self.db.pool)
            .await?;
        Ok(notifications)
    }

    pub async fn unread_count(&self, recipient: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(recipient)
        .fetch_one(&self.db.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    /// The lookup is scoped to the recipient, so another user's entry is
    /// indistinguishable from a missing one.
    pub async fn mark_read(
        &self,
        recipient: UserId,
        notification_id: NotificationId,
    ) -> AppResult<Notification> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?")
                .bind(notification_id)
                .bind(recipient)
                .execute(&self.db.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }

        info!(notification_id = %notification_id, recipient = %recipient, "notification marked read");
        self.fetch(notification_id, recipient)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    async fn fetch(
        &self,
        notification_id: NotificationId,
        recipient: UserId,
    ) -> AppResult<Option<Notification>> {
        let sql = format!("{} WHERE n.id = ? AND n.recipient_id = ?", NOTIFICATION_SELECT);
        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(notification_id)
            .bind(recipient)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(notification)
    }
}
