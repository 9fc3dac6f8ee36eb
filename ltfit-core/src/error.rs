//! Core error types for `ltfit`.

use thiserror::Error;

/// Core error type for `ltfit` models.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An API key did not match the expected format.
    #[error("Invalid API key ({name}): {reason}")]
    InvalidApiKey {
        /// Which key was rejected.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Start-of-week index outside 0..=6.
    #[error("Invalid start of week day: {0} (expected 0-6)")]
    InvalidStartOfWeek(u8),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
