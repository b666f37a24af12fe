// Privacy predicates - small named capability checks composed by handlers
//
// Ownership is a direct identity comparison between the viewer and the
// resource's author; there is no role hierarchy.

use crate::core::UserId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::viewer::ViewerContext;

/// The viewer's user id, or `Authentication` for anonymous viewers
pub fn require_authenticated(vc: &ViewerContext) -> AppResult<UserId> {
    vc.user_id.ok_or_else(|| {
        AppError::Authentication("Authentication credentials were not provided".to_string())
    })
}

/// Viewer must be authenticated and be the author of `resource`
pub fn require_author(vc: &ViewerContext, author: UserId, resource: &str) -> AppResult<UserId> {
    let viewer = require_authenticated(vc)?;
    if viewer != author {
        return Err(AppError::Authorization(format!(
            "Only the author can modify this {}",
            resource
        )));
    }
    Ok(viewer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_rejected() {
        let vc = ViewerContext::anonymous();
        assert!(matches!(
            require_authenticated(&vc),
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(
            require_author(&vc, UserId::new(1), "post"),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_author_check_is_identity() {
        let vc = ViewerContext::authenticated(UserId::new(1));
        assert_eq!(require_author(&vc, UserId::new(1), "post").unwrap(), UserId::new(1));
        assert!(matches!(
            require_author(&vc, UserId::new(2), "comment"),
            Err(AppError::Authorization(_))
        ));
    }
}
