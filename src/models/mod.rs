// Row and request types for the social store

pub mod notification;
pub mod pagination;
pub mod post;
pub mod user;

pub use notification::{
    NewNotification, Notification, NotificationTarget, VERB_COMMENTED, VERB_FOLLOWED, VERB_LIKED,
};
pub use pagination::{Page, PageRequest, PageWindow};
pub use post::{Comment, CommentUpdate, Like, NewComment, NewPost, Post, PostUpdate};
pub use user::{NewUser, ProfileUpdate, User, UserProfile};
