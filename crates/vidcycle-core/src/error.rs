//! Error types for vidcycle.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using vidcycle's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Postgres SQLSTATE for unique constraint violations.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Core error type for vidcycle operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Video not found
    #[error("Video not found: {0}")]
    VideoNotFound(Uuid),

    /// Label not found
    #[error("Label not found: {0}")]
    LabelNotFound(Uuid),

    /// Label name does not match the machine-key format
    #[error("Invalid label name '{0}': must start with an uppercase letter and contain only A-Z, 0-9 and underscores")]
    InvalidLabelName(String),

    /// A label with this name already exists in the organization
    #[error("A label named '{name}' already exists in organization {organization_id}")]
    DuplicateLabelName { organization_id: Uuid, name: String },

    /// Generic unique-constraint conflict
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// A system label with this name already exists in some organization
    #[error("'{0}' is already a system label")]
    AlreadySystemLabel(String),

    /// Text-classification oracle failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Asset store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Oracle output did not match the expected schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (missing credentials, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True if this error is a unique-constraint conflict.
    ///
    /// Idempotent flows (seeding, assignment, promotion fan-out) treat these
    /// as "already done".
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Duplicate(_) | Error::DuplicateLabelName { .. } => true,
            Error::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }

    /// True if this error originated in an external service (oracle, storage, network).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Inference(_) | Error::Storage(_) | Error::Request(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
