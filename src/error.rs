//! Error taxonomy for alarm operations.
//!
//! Handlers translate these into the `{success: false, message}` envelope in
//! `routes::error`; nothing here knows about HTTP.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlarmError {
    /// Client sent a malformed time, timezone, or id.
    #[error("{0}")]
    Validation(String),

    /// No record carries the requested id.
    #[error("Alarm not found.")]
    NotFound,

    /// Datastore unreachable or query failed.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type AlarmResult<T> = Result<T, AlarmError>;
