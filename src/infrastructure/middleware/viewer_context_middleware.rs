// ViewerContext Middleware - resolves the auth token into a request-scoped
// ViewerContext and injects it into request extensions

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{auth_tokens::TokenIssuer, viewer::ViewerContext};

/// Trait for application state that can resolve auth tokens
pub trait HasTokenIssuer {
    fn token_issuer(&self) -> &Arc<dyn TokenIssuer>;
}

/// Missing credentials produce an anonymous viewer; per-route predicates
/// decide whether that is acceptable. A presented but unknown token is
/// rejected outright.
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    T: HasTokenIssuer + Clone + Send + Sync + 'static,
{
    let viewer_context = match extract_token(request.headers())? {
        Some(token) => {
            let user_id = app_state
                .token_issuer()
                .resolve(token)
                .await?
                .ok_or_else(|| AppError::Authentication("Invalid token".to_string()))?;
            ViewerContext::authenticated(user_id)
        }
        None => ViewerContext::anonymous(),
    };

    debug!(request_id = %viewer_context.request_id, user_id = ?viewer_context.user_id, "viewer resolved");
    request.extensions_mut().insert(Arc::new(viewer_context));

    Ok(next.run(request).await)
}

/// Accepts `Authorization: Token <key>` and `Authorization: Bearer <key>`
fn extract_token(headers: &HeaderMap) -> AppResult<Option<&str>> {
    let Some(auth_header) = headers.get("authorization") else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Authentication("Malformed authorization header".to_string()))?;

    let token = auth_str
        .strip_prefix("Token ")
        .or_else(|| auth_str.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Authentication("Unsupported authorization scheme".to_string())
        })?;

    Ok(Some(token))
}
