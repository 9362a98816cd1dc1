//! Error types for the wilbe server

use thiserror::Error;

/// Top-level error type for wilbe operations
#[derive(Debug, Error)]
pub enum WilbeError {
    /// MongoDB connection or query failure
    #[error("Database error: {0}")]
    Database(String),

    /// Authentication or token failure
    #[error("Auth error: {0}")]
    Auth(String),

    /// Malformed or oversized HTTP request
    #[error("HTTP error: {0}")]
    Http(String),

    /// Client-supplied data failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Email or Slack delivery failure
    #[error("Notification error: {0}")]
    Notify(String),

    /// Document-storage upload failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Startup configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WilbeError>;

impl WilbeError {
    /// Whether the underlying store rejected a write for violating a
    /// unique index. Used by the task generator and waitlist signup to
    /// treat duplicate inserts as already-done rather than fatal.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            WilbeError::Database(msg) => {
                msg.contains("duplicate key") || msg.contains("E11000")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_detection() {
        let dup = WilbeError::Database("E11000 duplicate key error".into());
        assert!(dup.is_duplicate_key());

        let other = WilbeError::Database("connection refused".into());
        assert!(!other.is_duplicate_key());

        let auth = WilbeError::Auth("duplicate key".into());
        assert!(!auth.is_duplicate_key());
    }
}
