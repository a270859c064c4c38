//! Planner Error Types
//!
//! Every kind here describes the failure of a single item. The planner records
//! them in its [`Report`](crate::Report) and carries on with the next item;
//! nothing is rolled back.

use derive_more::{Display, Error};
use grove_store::EntityId;

/// A planner error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What the current actor was not allowed to do.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    #[display("edit")]
    Edit,
    #[display("delete")]
    Delete,
}

/// Classifies why an item could not be moved or renamed.
///
/// ### Operational Errors
/// - [`ErrorKind::Cycle`]
/// - [`ErrorKind::PermissionDenied`]
/// - [`ErrorKind::DestinationMissing`]
/// - [`ErrorKind::NameCollision`]
/// - [`ErrorKind::Interrupted`] - only ever recorded as a warning.
///
/// ### Dependency Errors
/// - [`ErrorKind::Storage`] - the store (or the uniquifier) failed; the
///   store error is attached as a child.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The folder would end up inside itself.
    #[display("cannot put {_0} into itself or one of its descendants")]
    Cycle(#[error(not(source))] EntityId),
    #[display("permission denied: cannot {action} {id}")]
    PermissionDenied { action: Permission, id: EntityId },
    #[display("destination folder does not exist: {_0}")]
    DestinationMissing(#[error(not(source))] EntityId),
    /// A different item with the requested display name already lives in
    /// `parent`. Renames never merge or overwrite.
    #[display("{parent} already contains an item named {name:?}")]
    NameCollision { name: String, parent: EntityId },
    /// The overwrite question for this item was never answered.
    #[display("no answer about overwriting with {_0}; existing file kept")]
    Interrupted(#[error(not(source))] EntityId),
    #[display("storage operation failed")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Interrupted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn id(name: &str) -> EntityId {
        EntityId::new("Drive", name).unwrap()
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::PermissionDenied { action: Permission::Delete, id: id("doc") }.to_string(),
            "permission denied: cannot delete Drive/doc"
        );
        assert_eq!(
            ErrorKind::NameCollision { name: "Report".to_string(), parent: id("a") }.to_string(),
            "Drive/a already contains an item named \"Report\""
        );
    }

    #[rstest]
    #[case(ErrorKind::Storage, true)]
    #[case(ErrorKind::Interrupted(id("f")), true)]
    #[case(ErrorKind::Cycle(id("a")), false)]
    #[case(ErrorKind::DestinationMissing(id("b")), false)]
    fn error_kind_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
