//! Error types for the request coordinator
//!
//! Only `InvalidArgument` is expected to reach callers. The other variants
//! signal a broken invariant inside the coordinator or registry.

use thiserror::Error;

/// Errors raised by the coordinator and its building blocks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The caller supplied an unusable argument (e.g. an empty batch)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A pending entry already exists for this permission
    #[error("a pending entry already exists for permission '{0}'")]
    DuplicateEntry(String),

    /// A broadcaster was resolved more than once
    #[error("result broadcaster was already resolved")]
    AlreadyResolved,

    /// A prompt result carried a different number of ids and grant flags
    #[error("prompt result has {ids} permissions but {flags} grant flags")]
    ResultLengthMismatch { ids: usize, flags: usize },
}

/// Result alias used throughout the crate
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoordinatorError::DuplicateEntry("CAMERA".to_string());
        assert_eq!(
            err.to_string(),
            "a pending entry already exists for permission 'CAMERA'"
        );

        let err = CoordinatorError::ResultLengthMismatch { ids: 2, flags: 1 };
        assert_eq!(err.to_string(), "prompt result has 2 permissions but 1 grant flags");
    }
}
