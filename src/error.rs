//! Error types for the tasks service
//!
//! Each layer has its own thiserror enum; `ServiceError` is what the
//! coordinator returns and what the HTTP layer renders.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::{ErrorResponse, TaskId};
use crate::store::StoreError;

// == Service Error Enum ==
/// Errors surfaced to callers of the coordinator.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Malformed identifier or payload; nothing was read or written
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store has no live record for the id
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// The record store could not be reached or timed out
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    /// The cache could not be reached. The coordinator absorbs cache
    /// failures, so no coordinator operation returns this kind.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A cached payload could not be decoded
    #[error("Corrupt cache payload for {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other store failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
            StoreError::Query(msg) => ServiceError::Internal(msg),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::StoreUnavailable(_)
            | ServiceError::CacheUnavailable(_)
            | ServiceError::Serialization { .. }
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
