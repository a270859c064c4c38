//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::EntityId;
use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Entity does not exist
    #[display("entity not found: {_0}")]
    NotFound(#[error(not(source))] EntityId),
    /// Entity already exists (for operations that require a free identifier)
    #[display("entity already exists: {_0}")]
    AlreadyExists(#[error(not(source))] EntityId),
    /// Identifier is empty, contains a separator, or contains null bytes
    #[display("invalid identifier: {_0:?}")]
    InvalidId(#[error(not(source))] String),
    /// No free identifier could be found for the desired name
    #[display("no free identifier left for: {_0}")]
    Exhausted(#[error(not(source))] String),
    /// Backend-specific error (connection, query, serialization, ...)
    #[display("backend error: {_0}")]
    Backend(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        let id = EntityId::new("drive", "doc").unwrap();
        assert_eq!(ErrorKind::NotFound(id.clone()).to_string(), "entity not found: drive/doc");
        assert_eq!(ErrorKind::AlreadyExists(id).to_string(), "entity already exists: drive/doc");
        assert_eq!(ErrorKind::InvalidId("a/b".to_string()).to_string(), "invalid identifier: \"a/b\"");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Backend("timeout".to_string()).is_retryable());
        assert!(!ErrorKind::Exhausted("doc".to_string()).is_retryable());
        assert!(!ErrorKind::InvalidId(String::new()).is_retryable());
    }
}
