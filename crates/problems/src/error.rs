//! Error types for fetching per-task results.

use thiserror::Error;

/// Errors that can occur while fetching issues or findings for one task.
///
/// The aggregation pipeline treats every variant the same way: the slot
/// for that task is marked failed and contributes no records.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The request did not settle within the per-task budget
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Whether this failure came from the per-task timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
