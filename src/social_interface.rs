// Social Interface - HTTP routes over the interaction handlers
// Handlers stay thin: extract, call one interaction, shape the response.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    core::{CommentId, NotificationId, PostId, UserId},
    error::{HttpError, HttpResult},
    infrastructure::middleware::{viewer_context_middleware, ApiJson, ApiPath, ApiQuery, Vc},
    models::{
        Comment, CommentUpdate, Like, NewComment, NewPost, NewUser, Notification, Page,
        PageRequest, Post, PostUpdate, ProfileUpdate, UserProfile,
    },
    privacy::require_authenticated,
    services::FollowOutcome,
};

pub fn create_social_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Accounts
        .route("/register", post(register))
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/follow", post(follow_user))
        .route("/users/{id}/unfollow", post(unfollow_user))
        // Posts and comments
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/posts/{id}/like", post(like_post))
        .route("/posts/{id}/unlike", post(unlike_post))
        .route("/comments", get(list_comments).post(create_comment))
        .route(
            "/comments/{id}",
            get(get_comment).patch(update_comment).delete(delete_comment),
        )
        // Viewer-scoped reads
        .route("/feed", get(feed))
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_notification_read))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    pub post: Option<PostId>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

async fn health(State(state): State<AppState>) -> HttpResult<Json<Value>> {
    state.database.health_check().await?;
    Ok(Json(json!({"status": "ok"})))
}

// Accounts

async fn register(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> HttpResult<(StatusCode, Json<RegisterResponse>)> {
    let users = &state.interactions.users;
    let user = users.register(new_user).await?;
    let token = state.tokens.issue(user.id).await?;
    let profile = users.profile(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: profile,
            token,
        }),
    ))
}

async fn get_profile(State(state): State<AppState>, vc: Vc) -> HttpResult<Json<UserProfile>> {
    Ok(Json(state.interactions.my_profile(&vc).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    vc: Vc,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> HttpResult<Json<UserProfile>> {
    Ok(Json(state.interactions.update_my_profile(&vc, update).await?))
}

async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> HttpResult<Json<UserProfile>> {
    Ok(Json(state.interactions.users.profile(user_id).await?))
}

async fn follow_user(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(user_id): ApiPath<UserId>,
) -> HttpResult<Json<Value>> {
    let outcome = state.interactions.follow(&vc, user_id).await?;
    let message = match outcome {
        FollowOutcome::Followed => "You are now following this user",
        FollowOutcome::AlreadyFollowing => "You already follow this user",
    };
    Ok(Json(json!({
        "message": message,
        "following": true,
        "created": outcome == FollowOutcome::Followed
    })))
}

async fn unfollow_user(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(user_id): ApiPath<UserId>,
) -> HttpResult<Json<Value>> {
    let removed = state.interactions.unfollow(&vc, user_id).await?;
    Ok(Json(json!({
        "message": "You are not following this user",
        "following": false,
        "removed": removed
    })))
}

// Posts

async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PostListQuery>,
) -> HttpResult<Json<Page<Post>>> {
    let window = PageRequest {
        page: query.page,
        page_size: query.page_size,
    }
    .resolve(&state.config.feed)?;
    let page = state
        .interactions
        .posts
        .list_posts(query.search.as_deref(), window)
        .await?;
    Ok(Json(page))
}

async fn create_post(
    State(state): State<AppState>,
    vc: Vc,
    ApiJson(new_post): ApiJson<NewPost>,
) -> HttpResult<(StatusCode, Json<Post>)> {
    let post = state.interactions.create_post(&vc, new_post).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<PostId>,
) -> HttpResult<Json<Post>> {
    Ok(Json(state.interactions.posts.get_post(post_id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(post_id): ApiPath<PostId>,
    ApiJson(update): ApiJson<PostUpdate>,
) -> HttpResult<Json<Post>> {
    Ok(Json(state.interactions.update_post(&vc, post_id, update).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(post_id): ApiPath<PostId>,
) -> HttpResult<StatusCode> {
    state.interactions.delete_post(&vc, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like_post(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(post_id): ApiPath<PostId>,
) -> HttpResult<(StatusCode, Json<Like>)> {
    require_authenticated(&vc)?;
    let post = state.interactions.posts.get_post(post_id).await?;
    let like = state.interactions.like(&vc, &post).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

async fn unlike_post(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(post_id): ApiPath<PostId>,
) -> HttpResult<Json<Value>> {
    require_authenticated(&vc)?;
    let post = state.interactions.posts.get_post(post_id).await?;
    state
        .interactions
        .unlike(&vc, &post)
        .await
        .map_err(HttpError::not_liked)?;
    Ok(Json(json!({"message": "Post unliked", "post": post.id})))
}

// Comments

async fn list_comments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommentListQuery>,
) -> HttpResult<Json<Page<Comment>>> {
    let window = PageRequest {
        page: query.page,
        page_size: query.page_size,
    }
    .resolve(&state.config.feed)?;
    let page = state
        .interactions
        .posts
        .list_comments(query.post, window)
        .await?;
    Ok(Json(page))
}

async fn create_comment(
    State(state): State<AppState>,
    vc: Vc,
    ApiJson(new_comment): ApiJson<NewComment>,
) -> HttpResult<(StatusCode, Json<Comment>)> {
    let comment = state.interactions.create_comment(&vc, new_comment).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_comment(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<CommentId>,
) -> HttpResult<Json<Comment>> {
    Ok(Json(state.interactions.posts.get_comment(comment_id).await?))
}

async fn update_comment(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(comment_id): ApiPath<CommentId>,
    ApiJson(update): ApiJson<CommentUpdate>,
) -> HttpResult<Json<Comment>> {
    Ok(Json(
        state
            .interactions
            .update_comment(&vc, comment_id, update)
            .await?,
    ))
}

async fn delete_comment(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(comment_id): ApiPath<CommentId>,
) -> HttpResult<StatusCode> {
    state.interactions.delete_comment(&vc, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Feed and notifications

async fn feed(
    State(state): State<AppState>,
    vc: Vc,
    ApiQuery(request): ApiQuery<PageRequest>,
) -> HttpResult<Json<Page<Post>>> {
    Ok(Json(state.interactions.feed(&vc, request).await?))
}

async fn list_notifications(
    State(state): State<AppState>,
    vc: Vc,
) -> HttpResult<Json<Vec<Notification>>> {
    Ok(Json(state.interactions.notifications(&vc).await?))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    vc: Vc,
    ApiPath(notification_id): ApiPath<NotificationId>,
) -> HttpResult<Json<Value>> {
    let notification = state
        .interactions
        .mark_notification_read(&vc, notification_id)
        .await?;
    Ok(Json(json!({
        "message": "Notification marked as read",
        "notification": notification
    })))
}
