use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use social_feed::{
    app_state::AppState, config::Config, infrastructure::SocialDatabase,
    social_interface::create_social_router,
};

async fn app() -> Router {
    let db = Arc::new(SocialDatabase::new_in_memory().await.unwrap());
    create_social_router(AppState::with_database(db, Config::default()))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Token {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user and returns (id, token)
async fn register(app: &Router, username: &str) -> (i64, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({"username": username, "email": format!("{}@example.com", username)})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["user"]["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn create_post(app: &Router, token: &str, title: &str) -> i64 {
    let (status, body) = call(
        app,
        Method::POST,
        "/posts",
        Some(token),
        Some(json!({"title": title, "content": "body"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_follow_like_feed_notifications_over_http() {
    let app = app().await;
    let (u1, t1) = register(&app, "u1").await;
    let (_u2, t2) = register(&app, "u2").await;
    let p1 = create_post(&app, &t1, "P1").await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/users/{}/follow", u1),
        Some(&t2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/posts/{}/like", p1),
        Some(&t2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["post"], p1);

    let (status, body) = call(
        &app,
        Method::GET,
        "/feed?page=1&page_size=10",
        Some(&t2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], p1);
    assert_eq!(results[0]["likes_count"], 1);

    let (status, body) = call(&app, Method::GET, "/notifications", Some(&t1), None).await;
    assert_eq!(status, StatusCode::OK);
    let notes = body.as_array().unwrap();
    assert_eq!(notes[0]["verb"], "liked your post");
    assert_eq!(notes[0]["target"], json!({"kind": "post", "id": p1}));
    assert_eq!(notes[0]["read"], false);

    let note_id = notes[0]["id"].as_i64().unwrap();
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/notifications/{}/read", note_id),
        Some(&t2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/notifications/{}/read", note_id),
        Some(&t1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notification"]["read"], true);
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app().await;
    let (u1, t1) = register(&app, "u1").await;
    let (_u2, t2) = register(&app, "u2").await;
    let p1 = create_post(&app, &t1, "P1").await;

    // Self-follow and unknown user
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/users/{}/follow", u1),
        Some(&t1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "self_reference");
    let (status, _) = call(&app, Method::POST, "/users/999/follow", Some(&t1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::POST, "/users/999/unfollow", Some(&t1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Double like, unlike without like, unknown post
    let like = format!("/posts/{}/like", p1);
    let unlike = format!("/posts/{}/unlike", p1);
    assert_eq!(call(&app, Method::POST, &like, Some(&t2), None).await.0, StatusCode::CREATED);
    let (status, body) = call(&app, Method::POST, &like, Some(&t2), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "already_exists");
    assert_eq!(call(&app, Method::POST, &unlike, Some(&t2), None).await.0, StatusCode::OK);
    let (status, body) = call(&app, Method::POST, &unlike, Some(&t2), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "not_found");
    assert_eq!(
        call(&app, Method::POST, "/posts/999/like", Some(&t2), None).await.0,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        call(&app, Method::POST, "/posts/999/unlike", Some(&t2), None).await.0,
        StatusCode::NOT_FOUND
    );

    // Authentication and authorization
    assert_eq!(call(&app, Method::GET, "/feed", None, None).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(
        call(&app, Method::GET, "/feed", Some("bogus"), None).await.0,
        StatusCode::UNAUTHORIZED
    );
    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/posts/{}", p1),
        Some(&t2),
        Some(json!({"title": "mine now"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "authorization_error");

    // Malformed input
    let (status, body) = call(
        &app,
        Method::POST,
        "/posts",
        Some(&t1),
        Some(json!({"title": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let (status, _) = call(&app, Method::GET, "/feed?page=0", Some(&t1), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_and_comment_lifecycle() {
    let app = app().await;
    let (_u1, t1) = register(&app, "author").await;
    let (_u2, t2) = register(&app, "reader").await;
    let p1 = create_post(&app, &t1, "Lifecycle").await;

    let (status, comment) = call(
        &app,
        Method::POST,
        "/comments",
        Some(&t2),
        Some(json!({"post": p1, "content": "great read"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = comment["id"].as_i64().unwrap();

    let (_, body) = call(&app, Method::GET, &format!("/comments?post={}", p1), None, None).await;
    assert_eq!(body["count"], 1);
    let (_, body) = call(&app, Method::GET, &format!("/posts/{}", p1), None, None).await;
    assert_eq!(body["comments_count"], 1);

    let (_, body) = call(&app, Method::GET, "/notifications", Some(&t1), None).await;
    assert_eq!(body[0]["verb"], "commented on your post");

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/comments/{}", comment_id),
        Some(&t1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/posts/{}", p1),
        Some(&t1),
        Some(json!({"content": "revised"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "revised");
    assert_eq!(body["title"], "Lifecycle");

    let (status, _) = call(&app, Method::DELETE, &format!("/posts/{}", p1), Some(&t1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        call(&app, Method::GET, &format!("/comments/{}", comment_id), None, None).await.0,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        call(&app, Method::GET, &format!("/posts/{}", p1), None, None).await.0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_register_profile_and_search() {
    let app = app().await;
    let (u1, t1) = register(&app, "writer").await;
    let (_u2, t2) = register(&app, "follower").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({"username": "writer", "email": "dup@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "already_exists");

    call(&app, Method::POST, &format!("/users/{}/follow", u1), Some(&t2), None).await;
    let (status, body) = call(
        &app,
        Method::PATCH,
        "/profile",
        Some(&t1),
        Some(json!({"bio": "I write things"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "I write things");
    assert_eq!(body["followers_count"], 1);
    assert_eq!(body["following_count"], 0);

    let (_, body) = call(&app, Method::GET, &format!("/users/{}", u1), None, None).await;
    assert_eq!(body["username"], "writer");

    create_post(&app, &t1, "Rust ownership").await;
    create_post(&app, &t1, "Sourdough").await;
    let (status, body) = call(
        &app,
        Method::GET,
        "/posts?search=rust&page_size=500",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["page_size"], 100);
    assert_eq!(body["results"][0]["title"], "Rust ownership");
}

#[tokio::test]
async fn test_anonymous_writes_never_reveal_missing_ids() {
    let app = app().await;
    let (_u1, t1) = register(&app, "owner").await;
    let p1 = create_post(&app, &t1, "Exists").await;

    for uri in ["/posts/999".to_string(), format!("/posts/{}", p1)] {
        let (status, body) = call(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "DELETE {}", uri);
        assert_eq!(body["error"], "authentication_error");

        let (status, _) = call(&app, Method::PATCH, &uri, None, Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "PATCH {}", uri);
    }

    let (status, _) = call(&app, Method::DELETE, "/comments/999", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(
        &app,
        Method::PATCH,
        "/comments/999",
        None,
        Some(json!({"content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
