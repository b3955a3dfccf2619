use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

/// Domain error taxonomy. Every service path returns one of these; nothing
/// in the core is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered.")]
    DuplicateEmail,
    /// Intentionally undifferentiated between "no such user" and "wrong
    /// password" so a caller cannot probe which part failed.
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("User not found.")]
    UserNotFound,
    #[error("Subscription owner not found.")]
    OwnerNotFound,
    #[error("Invalid subscription type: {0}. Valid types are: FreeTrail, Organization.")]
    InvalidSubscriptionType(String),
    #[error("Internal server error.")]
    Store(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::DuplicateEmail,
            StoreError::Other(e) => ApiError::Store(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidSubscriptionType(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UserNotFound | ApiError::OwnerNotFound => StatusCode::NOT_FOUND,
            ApiError::DuplicateEmail => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(e) = &self {
            error!(error = %e, "store failure");
        }
        let body = json!({ "success": false, "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
