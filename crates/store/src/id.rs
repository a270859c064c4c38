//! Entity identifiers and their validation.

use crate::error::{ErrorKind, Result};
use derive_more::Display;

/// Globally unique address of a folder or a file.
///
/// An identifier is made of the *drive* it lives in (the scope inside which
/// names must be unique) and a *name*. The identifier is an address, not a
/// label: an entity's display name is stored separately and may differ.
///
/// # Examples
///
/// ```
/// use grove_store::EntityId;
///
/// let id = EntityId::new("Drive", " Reports ").unwrap();
/// assert_eq!(id.name(), "Reports");
/// assert_eq!(id.to_string(), "Drive/Reports");
///
/// assert!(EntityId::new("Drive", "a/b").is_err());
/// assert!(EntityId::new("", "doc").is_err());
/// ```
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("{drive}/{name}")]
pub struct EntityId {
    drive: String,
    name: String,
}

impl EntityId {
    /// Builds an identifier after trimming and validating both parts.
    pub fn new(drive: impl AsRef<str>, name: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            drive: validate(drive.as_ref())?,
            name: validate(name.as_ref())?,
        })
    }

    /// The drive (uniqueness scope) this identifier belongs to.
    pub fn drive(&self) -> &str {
        &self.drive
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns an identifier in the same drive with a different name.
    pub fn sibling(&self, name: impl AsRef<str>) -> Result<Self> {
        Self::new(&self.drive, name)
    }
}

/// Validates a single identifier segment.
///
/// Segments are trimmed; empty segments, segments containing the `/`
/// separator and segments containing null bytes are rejected with
/// [`InvalidId`](ErrorKind::InvalidId).
fn validate(segment: &str) -> Result<String> {
    let trimmed = segment.trim();
    if trimmed.is_empty() || trimmed.contains('/') || trimmed.contains('\0') {
        exn::bail!(ErrorKind::InvalidId(segment.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Drive", "doc", "Drive/doc")]
    #[case("  Drive ", "\tdoc\n", "Drive/doc")]
    #[case("Drive", "My Document.pdf", "Drive/My Document.pdf")]
    fn test_valid_ids(#[case] drive: &str, #[case] name: &str, #[case] expected: &str) {
        assert_eq!(EntityId::new(drive, name).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("", "doc")]
    #[case("Drive", "")]
    #[case("Drive", "   ")]
    #[case("Drive", "a/b")]
    #[case("Dr/ive", "doc")]
    #[case("Drive", "a\0b")]
    fn test_invalid_ids(#[case] drive: &str, #[case] name: &str) {
        let err = EntityId::new(drive, name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidId(_)));
    }

    #[test]
    fn test_sibling_keeps_drive() {
        let id = EntityId::new("Drive", "doc").unwrap();
        let sibling = id.sibling("doc-1").unwrap();
        assert_eq!(sibling.drive(), "Drive");
        assert_eq!(sibling.name(), "doc-1");
    }

    #[test]
    fn test_ordering_is_by_drive_then_name() {
        let a = EntityId::new("A", "z").unwrap();
        let b = EntityId::new("B", "a").unwrap();
        assert!(a < b);
    }
}
