// Services - the social core, leaves first

pub mod notification_log;
pub mod user_directory;
pub mod post_store;
pub mod like_ledger;
pub mod feed_assembler;
pub mod interactions;

pub use feed_assembler::FeedAssembler;
pub use interactions::Interactions;
pub use like_ledger::LikeLedger;
pub use notification_log::NotificationLog;
pub use post_store::PostStore;
pub use user_directory::{FollowOutcome, UserDirectory};

use std::sync::Arc;

use crate::config::FeedConfig;
use crate::infrastructure::database::SocialDatabase;

/// Wire every component onto one store
pub fn build_interactions(db: Arc<SocialDatabase>, limits: FeedConfig) -> Interactions {
    let notifications = Arc::new(NotificationLog::new(db.clone()));
    let users = Arc::new(UserDirectory::new(db.clone(), notifications.clone()));
    let posts = Arc::new(PostStore::new(db.clone()));
    let likes = Arc::new(LikeLedger::new(db.clone(), notifications.clone()));
    let feed = Arc::new(FeedAssembler::new(db, limits));
    Interactions::new(users, posts, likes, notifications, feed)
}
