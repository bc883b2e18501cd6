//! Error types for note storage and the HTTP boundary.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use notes_types::{ErrorResponse, NOT_FOUND_MESSAGE};
use std::fmt;
use thiserror::Error;

const REDACTED_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum NoteError {
    /// A required field was missing or blank
    #[error("{0}")]
    Validation(String),

    #[error("Note not found: {0}")]
    NotFound(i64),

    /// The backing file or database failed
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type NoteResult<T> = std::result::Result<T, NoteError>;

impl NoteError {
    /// Message placed in the `error` field of the response body
    pub fn public_message(&self, expose_storage: bool) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            Self::Storage(msg) if expose_storage => msg.clone(),
            Self::Storage(_) => REDACTED_MESSAGE.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A `NoteError` on its way out of a handler, with the server's disclosure policy
/// for storage failures
#[derive(Debug)]
pub struct ApiError {
    error: NoteError,
    expose_storage: bool,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(error: NoteError, expose_storage: bool) -> Self {
        Self {
            error,
            expose_storage,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.error.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        if let NoteError::Storage(msg) = &self.error {
            log::error!("[NOTES] Storage failure: {}", msg);
        }
        HttpResponse::build(self.status_code())
            .json(ErrorResponse::new(self.error.public_message(self.expose_storage)))
    }
}

impl From<rusqlite::Error> for NoteError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(format!("Database error: {}", e))
    }
}

impl From<r2d2::Error> for NoteError {
    fn from(e: r2d2::Error) -> Self {
        Self::Storage(format!("Connection pool error: {}", e))
    }
}

impl From<sqlx::Error> for NoteError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(format!("Database error: {}", e))
    }
}

impl From<std::io::Error> for NoteError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(format!("IO error: {}", e))
    }
}

impl From<serde_json::Error> for NoteError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(format!("JSON error: {}", e))
    }
}
