use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Self reference: {0}")]
    SelfReference(String),
    #[error("Forbidden: {0}")]
    Authorization(String),
    #[error("Unauthorized: {0}")]
    Authentication(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error kind for response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::SelfReference(_) => "self_reference",
            AppError::Authorization(_) => "authorization_error",
            AppError::Authentication(_) => "authentication_error",
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                "internal_error"
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            AppError::SelfReference(_) => StatusCode::BAD_REQUEST,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::AlreadyExists(msg)
            | AppError::SelfReference(msg)
            | AppError::Authorization(msg)
            | AppError::Authentication(msg) => msg.clone(),
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        }
    }

    fn into_response_with_status(self, status: StatusCode) -> Response {
        let body = Json(json!({
            "error": self.kind(),
            "message": self.public_message(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.into_response_with_status(status)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Error returned by HTTP handlers. Carries an optional status override for
/// routes whose contract reports a kind under a different status code.
#[derive(Debug)]
pub struct HttpError {
    error: AppError,
    status: Option<StatusCode>,
}

impl HttpError {
    /// `unlike` on a pair that was never liked keeps kind `not_found` but
    /// answers 400.
    pub fn not_liked(error: AppError) -> Self {
        let status = match error {
            AppError::NotFound(_) => Some(StatusCode::BAD_REQUEST),
            _ => None,
        };
        Self { error, status }
    }
}

impl From<AppError> for HttpError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            status: None,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or_else(|| self.error.status_code());
        self.error.into_response_with_status(status)
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
