//! Table and storage error types

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network-level failure before a backend response arrived
    #[error("store request failed: {0}")]
    Transport(String),

    /// Query by key matched no row
    #[error("row not found")]
    NotFound,

    /// Uniqueness or other constraint violation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other error response from the backend
    #[error("store returned {status} ({code}): {message}")]
    Response {
        status: u16,
        code: String,
        message: String,
    },

    #[error("failed to decode store response: {0}")]
    Decode(String),
}

/// Error body the table endpoints return.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Classify an error response by status and body.
///
/// `PGRST116` is "zero rows where one was expected", `23505` the
/// relational unique-violation code; both get dedicated variants
/// because callers recover from them (lazy profile creation, duplicate
/// enrollment).
pub(crate) fn classify_error(status: u16, body: ErrorBody) -> StoreError {
    let code = body.code.unwrap_or_default();
    let message = body.message.unwrap_or_else(|| format!("status {}", status));

    if code == "PGRST116" || status == 404 || status == 406 {
        return StoreError::NotFound;
    }
    if code == "23505" || status == 409 {
        return StoreError::Conflict(message);
    }
    StoreError::Response {
        status,
        code,
        message,
    }
}
