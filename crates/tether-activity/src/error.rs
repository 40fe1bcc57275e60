//! Error types for tether-activity

use thiserror::Error;

/// Errors that can occur when building an activity log
#[derive(Debug, Error)]
pub enum ActivityError {
    /// History capacity must be at least one
    #[error("invalid history capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ActivityError {
    fn from(e: serde_json::Error) -> Self {
        ActivityError::Config(e.to_string())
    }
}

/// Result type for activity log operations
pub type ActivityResult<T> = Result<T, ActivityError>;
