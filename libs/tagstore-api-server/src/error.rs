use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use tagstore_api::StoreError;

/// Failure of a request handler, rendered as a JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Path segment that cannot name a record.
    #[error("invalid record id '{0}'")]
    InvalidId(String),

    /// Patch body missing, not JSON, or of the wrong shape.
    #[error("{0}")]
    Body(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Body(rejection) => rejection.into_response(),
            ApiError::InvalidId(_) | ApiError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" }))).into_response()
            }
            ApiError::Store(StoreError::PreconditionRequired) => (
                StatusCode::PRECONDITION_REQUIRED,
                Json(json!({ "error": "Precondition Required: If-Match header is required" })),
            )
                .into_response(),
            ApiError::Store(StoreError::PreconditionFailed { current }) => (
                StatusCode::PRECONDITION_FAILED,
                [(header::ETAG, current.to_string())],
                Json(json!({
                    "error": "Precondition Failed: Resource was modified by another user",
                    "currentETag": current,
                })),
            )
                .into_response(),
            ApiError::Store(e @ StoreError::Serialize(_)) => {
                tracing::error!(error = %e, "failed to fingerprint record");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

/// Failure to start or run the listener.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("bind api {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("axum serve: {0}")]
    Serve(#[source] std::io::Error),
}
