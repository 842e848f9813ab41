//! Unified error types for the book catalog.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Startup and process-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a book store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Identifier is not a valid ObjectId.
    #[error("Cast to ObjectId failed for value \"{0}\"")]
    InvalidId(String),

    /// A field value cannot be cast to the stored type.
    #[error("Cast to {kind} failed for value \"{value}\" at path \"{path}\"")]
    Cast {
        /// Target type name.
        kind: &'static str,
        /// Offending value, as sent.
        value: String,
        /// Field path.
        path: &'static str,
    },

    /// MongoDB driver error.
    #[error("{0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be mapped to a book.
    #[error("corrupt document: {0}")]
    Corrupt(String),
}

/// Errors returned from HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Requested book does not exist.
    #[error("Book not found")]
    NotFound,

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body carried by every error and confirmation response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Create a message body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(ref e) = self {
            crate::metrics::inc_store_errors();
            tracing::error!(error = %e, "store operation failed");
        }
        (self.status(), Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

/// Convenient Result type alias for startup code.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
