use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fallible_collections::TryReserveError;
use serde::Serialize;
use thiserror::Error;

/// Every failure mode the engine or its HTTP adapter can surface, mapped
/// to the taxonomy in the design: input validation, not-found, resource
/// exhaustion, and I/O.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("no record found at index {index}, store has {size} record(s)")]
    IndexNotFound { index: usize, size: usize },

    #[error("no record found for uuid {0}")]
    UuidNotFound(String),

    #[error("store expects dimension {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("missing required query parameter {0}")]
    MissingParameter(&'static str),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("allocation error: {0:?}")]
    Allocation(TryReserveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persisted file is not in the expected format: {0}")]
    InvalidPersistedFormat(String),
}

impl From<TryReserveError> for ServerError {
    fn from(input: TryReserveError) -> Self {
        Self::Allocation(input)
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::IndexNotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::UuidNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::DimensionMismatch { .. } => StatusCode::BAD_REQUEST,
            ServerError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ServerError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Allocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::InvalidPersistedFormat(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(%status, error = %self, "request failed");
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
