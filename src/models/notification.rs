use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use crate::core::{millis_to_datetime, NotificationId, TargetKind, UserId};

pub const VERB_FOLLOWED: &str = "started following you";
pub const VERB_LIKED: &str = "liked your post";
pub const VERB_COMMENTED: &str = "commented on your post";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTarget {
    pub kind: TargetKind,
    pub id: i64,
}

impl NotificationTarget {
    pub fn new(kind: TargetKind, id: impl Into<i64>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub actor: UserId,
    pub actor_username: String,
    pub verb: String,
    pub target: Option<NotificationTarget>,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl FromRow<'_, SqliteRow> for Notification {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let target_kind: Option<String> = row.try_get("target_kind")?;
        let target_id: Option<i64> = row.try_get("target_id")?;
        let target = match (target_kind.as_deref().and_then(TargetKind::parse), target_id) {
            (Some(kind), Some(id)) => Some(NotificationTarget { kind, id }),
            _ => None,
        };

        Ok(Self {
            id: row.try_get("id")?,
            recipient: row.try_get("recipient_id")?,
            actor: row.try_get("actor_id")?,
            actor_username: row.try_get("actor_username")?,
            verb: row.try_get("verb")?,
            target,
            timestamp: millis_to_datetime(row.try_get("created_at")?),
            read: row.try_get("is_read")?,
        })
    }
}

/// Event to append to a recipient's log
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: UserId,
    pub actor: UserId,
    pub verb: String,
    pub target: Option<NotificationTarget>,
}

impl NewNotification {
    pub fn new(recipient: UserId, actor: UserId, verb: &str) -> Self {
        Self {
            recipient,
            actor,
            verb: verb.to_string(),
            target: None,
        }
    }

    pub fn with_target(mut self, target: NotificationTarget) -> Self {
        self.target = Some(target);
        self
    }
}
