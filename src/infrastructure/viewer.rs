// ViewerContext - who is making the request
// Business logic never reads headers; it only sees the viewer.

use uuid::Uuid;

use crate::core::UserId;

#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub user_id: Option<UserId>,
    pub request_id: String,
}

impl ViewerContext {
    pub fn authenticated(user_id: UserId) -> Self {
        ViewerContext {
            user_id: Some(user_id),
            request_id: format!("user-{}-{}", user_id, Uuid::new_v4()),
        }
    }

    pub fn anonymous() -> Self {
        ViewerContext {
            user_id: None,
            request_id: format!("req-{}", Uuid::new_v4()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}
