//! Gateway error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rollcall_core::{ActorError, StoreError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Anything a route handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request is missing something or names something unparseable.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No valid session for a privileged route.
    #[error("unauthorized")]
    Unauthorized,

    /// The named resource does not exist.
    #[error("not found")]
    NotFound,

    /// A request named a partition its actor is not bound to.
    #[error(transparent)]
    Actor(#[from] ActorError),

    /// The store rejected or could not serve the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            Self::Actor(ActorError::PartitionMismatch { .. }) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            Self::Actor(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            Self::Store(source) => {
                error!(error = %source, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
