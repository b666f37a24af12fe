// Interaction Handlers - authorization, mutation, then side effects
//
// Every write path runs in that order: a privacy predicate on the viewer,
// the mutation, then any notification (which may fail without undoing the
// mutation).

use std::sync::Arc;
use tracing::info;

use crate::core::{CommentId, NotificationId, PostId, TargetKind, UserId};
use crate::error::AppResult;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{
    Comment, CommentUpdate, Like, NewComment, NewNotification, NewPost, Notification,
    NotificationTarget, Page, PageRequest, Post, PostUpdate, ProfileUpdate, UserProfile,
    VERB_COMMENTED,
};
use crate::privacy::{require_authenticated, require_author};
use crate::services::{
    feed_assembler::FeedAssembler, like_ledger::LikeLedger, notification_log::NotificationLog,
    post_store::PostStore, user_directory::FollowOutcome, user_directory::UserDirectory,
};

#[derive(Clone)]
pub struct Interactions {
    pub users: Arc<UserDirectory>,
    pub posts: Arc<PostStore>,
    pub likes: Arc<LikeLedger>,
    pub notifications: Arc<NotificationLog>,
    pub feed: Arc<FeedAssembler>,
}

impl Interactions {
    pub fn new(
        users: Arc<UserDirectory>,
        posts: Arc<PostStore>,
        likes: Arc<LikeLedger>,
        notifications: Arc<NotificationLog>,
        feed: Arc<FeedAssembler>,
    ) -> Self {
        Self {
            users,
            posts,
            likes,
            notifications,
            feed,
        }
    }

    // Follow graph

    pub async fn follow(&self, vc: &ViewerContext, target: UserId) -> AppResult<FollowOutcome> {
        let viewer = require_authenticated(vc)?;
        self.users.follow(viewer, target).await
    }

    pub async fn unfollow(&self, vc: &ViewerContext, target: UserId) -> AppResult<bool> {
        let viewer = require_authenticated(vc)?;
        self.users.unfollow(viewer, target).await
    }

    // Profiles

    pub async fn my_profile(&self, vc: &ViewerContext) -> AppResult<UserProfile> {
        let viewer = require_authenticated(vc)?;
        self.users.profile(viewer).await
    }

    pub async fn update_my_profile(
        &self,
        vc: &ViewerContext,
        update: ProfileUpdate,
    ) -> AppResult<UserProfile> {
        let viewer = require_authenticated(vc)?;
        self.users.update_profile(viewer, update).await?;
        self.users.profile(viewer).await
    }

    // Posts

    pub async fn create_post(&self, vc: &ViewerContext, new_post: NewPost) -> AppResult<Post> {
        let viewer = require_authenticated(vc)?;
        self.posts.create_post(viewer, new_post).await
    }

    pub async fn update_post(
        &self,
        vc: &ViewerContext,
        post_id: PostId,
        update: PostUpdate,
    ) -> AppResult<Post> {
        require_authenticated(vc)?;
        let post = self.posts.get_post(post_id).await?;
        require_author(vc, post.author, "post")?;
        self.posts.update_post(post_id, update).await
    }

    pub async fn delete_post(&self, vc: &ViewerContext, post_id: PostId) -> AppResult<()> {
        require_authenticated(vc)?;
        let post = self.posts.get_post(post_id).await?;
        let viewer = require_author(vc, post.author, "post")?;
        self.posts.delete_post(post_id).await?;
        info!(post_id = %post_id, viewer = %viewer, "post removed by author");
        Ok(())
    }

    // Comments

    /// Any authenticated user may comment; the post's author hears about it
    /// unless they wrote the comment.
    pub async fn create_comment(
        &self,
        vc: &ViewerContext,
        new_comment: NewComment,
    ) -> AppResult<Comment> {
        let viewer = require_authenticated(vc)?;
        let post = self.posts.get_post(new_comment.post).await?;
        let comment = self.posts.create_comment(viewer, new_comment).await?;

        if post.author != viewer {
            self.notifications
                .notify(
                    NewNotification::new(post.author, viewer, VERB_COMMENTED)
                        .with_target(NotificationTarget::new(TargetKind::Post, post.id)),
                )
                .await;
        }
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        vc: &ViewerContext,
        comment_id: CommentId,
        update: CommentUpdate,
    ) -> AppResult<Comment> {
        require_authenticated(vc)?;
        let comment = self.posts.get_comment(comment_id).await?;
        require_author(vc, comment.author, "comment")?;
        self.posts.update_comment(comment_id, update).await
    }

    pub async fn delete_comment(&self, vc: &ViewerContext, comment_id: CommentId) -> AppResult<()> {
        require_authenticated(vc)?;
        let comment = self.posts.get_comment(comment_id).await?;
        require_author(vc, comment.author, "comment")?;
        self.posts.delete_comment(comment_id).await
    }

    // Likes

    pub async fn like(&self, vc: &ViewerContext, post: &Post) -> AppResult<Like> {
        let viewer = require_authenticated(vc)?;
        self.likes.like(viewer, post).await
    }

    pub async fn unlike(&self, vc: &ViewerContext, post: &Post) -> AppResult<()> {
        let viewer = require_authenticated(vc)?;
        self.likes.unlike(viewer, post).await
    }

    // Reads scoped to the viewer

    pub async fn feed(&self, vc: &ViewerContext, request: PageRequest) -> AppResult<Page<Post>> {
        let viewer = require_authenticated(vc)?;
        self.feed.feed_for(viewer, request).await
    }

    pub async fn notifications(&self, vc: &ViewerContext) -> AppResult<Vec<Notification>> {
        let viewer = require_authenticated(vc)?;
        self.notifications.list_for(viewer).await
    }

    pub async fn mark_notification_read(
        &self,
        vc: &ViewerContext,
        notification_id: NotificationId,
    ) -> AppResult<Notification> {
        let viewer = require_authenticated(vc)?;
        self.notifications.mark_read(viewer, notification_id).await
    }
}
