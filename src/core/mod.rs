// Core types and primitives shared by every component

pub mod strong_types;

pub use strong_types::{
    current_time_millis, millis_to_datetime, CommentId, NotificationId, PostId, TargetKind, UserId,
};
