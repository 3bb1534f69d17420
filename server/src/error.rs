use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use haggle_common::listing::ListingError;
use serde::Serialize;
use tracing::error;

/// Failures from the listing and conversation stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid listing: {0}")]
    InvalidListing(#[from] ListingError),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// What an API caller is told when a request fails. Only a short fixed
/// message crosses the wire; details stay in the server log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(&'static str),
    NotFound(&'static str),
    Internal(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(m) | ApiError::NotFound(m) | ApiError::Internal(m) => m,
        }
    }

    /// Map a store failure onto the three response classes, logging anything
    /// that becomes a 500 under `context`.
    pub fn from_store(err: StoreError, context: &'static str) -> Self {
        match err {
            StoreError::InvalidListing(_) => ApiError::BadRequest("Invalid listing"),
            other => {
                error!("{context}: {other}");
                ApiError::Internal(context)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.message().to_string(),
            }),
        )
            .into_response()
    }
}
