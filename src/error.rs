//! Structured error types for listing and reporting requests.

use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    InvalidArgument,
    Unavailable,
    InternalError,
    UnknownTool,
}

/// Errors raised by the scope resolver, listing and dashboard paths.
#[derive(Debug, Error)]
pub enum DeskError {
    /// A referenced record (acting user) does not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A request argument failed validation before any store round trip.
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// A store call failed; see [`DeskError::code`] for how it is classified.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// No pooled connection could be checked out in time.
    #[error("store unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("schema migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("failed to render result: {0}")]
    Render(#[from] serde_json::Error),

    /// A blocking worker died before producing a result.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DeskError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DeskError::NotFound { .. } => ErrorCode::NotFound,
            DeskError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            DeskError::Store(err) if store_unreachable(err) => ErrorCode::Unavailable,
            DeskError::Pool(_) => ErrorCode::Unavailable,
            DeskError::UnknownTool(_) => ErrorCode::UnknownTool,
            DeskError::Store(_)
            | DeskError::Migration(_)
            | DeskError::Render(_)
            | DeskError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Field the error refers to, when it is a validation error.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DeskError::InvalidArgument { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Serializable body returned to tool and HTTP callers.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            field: self.field().map(String::from),
        }
    }
}

/// Busy, locked, unopenable or I/O-failing stores are transient; anything
/// else (bad SQL, type mismatches, limits) is a defect on this side.
fn store_unreachable(err: &rusqlite::Error) -> bool {
    use rusqlite::ErrorCode as Sqlite;
    matches!(
        err.sqlite_error_code(),
        Some(
            Sqlite::DatabaseBusy
                | Sqlite::DatabaseLocked
                | Sqlite::CannotOpen
                | Sqlite::SystemIoFailure
        )
    )
}

impl From<tokio::task::JoinError> for DeskError {
    fn from(err: tokio::task::JoinError) -> Self {
        DeskError::Internal(err.to_string())
    }
}

/// Structured error for tool and HTTP responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Result type for desk operations.
pub type Result<T> = std::result::Result<T, DeskError>;
