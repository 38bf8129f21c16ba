//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Item store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted item file {path}: checksum mismatch")]
    Corrupted { path: String },

    #[error("Lock poisoned")]
    LockPoisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StoreError::Corrupted {
            path: "/tmp/x.json".into(),
        };
        assert!(err.to_string().contains("/tmp/x.json"));
        assert_eq!(StoreError::LockPoisoned.to_string(), "Lock poisoned");
    }
}
