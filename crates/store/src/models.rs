//! Hierarchy models.
//!
//! These types are snapshots of what the [`Store`](crate::Store) holds. They
//! are never authoritative: mutate a snapshot, then [`save`](crate::Store::save)
//! it straight away.

use crate::EntityId;
use std::collections::BTreeSet;

/// A tree-structured container with at most one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: EntityId,
    /// User-facing name, independent of the identifier.
    pub name: String,
    /// `None` for root (or orphan) folders.
    pub parent: Option<EntityId>,
    /// Child folders, as seen by the store when this snapshot was read.
    /// Ignored by [`save`](crate::Store::save).
    pub child_folders: Vec<EntityId>,
    /// Child files, as seen by the store when this snapshot was read.
    /// Ignored by [`save`](crate::Store::save).
    pub child_files: Vec<EntityId>,
}
impl Folder {
    pub fn new(id: EntityId, name: impl Into<String>, parent: Option<EntityId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            child_folders: Vec::new(),
            child_files: Vec::new(),
        }
    }

    /// `true` when the snapshot has neither child folders nor child files.
    pub fn is_empty(&self) -> bool {
        self.child_folders.is_empty() && self.child_files.is_empty()
    }

    /// Number of direct children of both kinds.
    pub fn child_count(&self) -> usize {
        self.child_folders.len() + self.child_files.len()
    }
}

/// A content-bearing entity that may live in several folders at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub id: EntityId,
    /// User-facing name, independent of the identifier.
    pub name: String,
    /// Opaque content, never interpreted here.
    pub content: Vec<u8>,
    /// Every folder this file is listed in. Empty for orphans.
    pub parents: BTreeSet<EntityId>,
}
impl File {
    pub fn new(id: EntityId, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            name: name.into(),
            content: content.into(),
            parents: BTreeSet::new(),
        }
    }

    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parents.insert(parent);
        self
    }

    /// The parent used when a single location has to be displayed.
    ///
    /// This is derived from [`parents`](Self::parents) and never stored.
    pub fn primary_parent(&self) -> Option<&EntityId> {
        self.parents.first()
    }

    /// Swaps `from` for `to` in the parent set. Returns `true` if the set
    /// changed (and therefore needs saving).
    pub fn reparent(&mut self, from: Option<&EntityId>, to: &EntityId) -> bool {
        let removed = from.is_some_and(|from| self.parents.remove(from));
        let added = self.parents.insert(to.clone());
        removed || added
    }
}

/// Anything the store can persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Folder(Folder),
    File(File),
}
impl Entity {
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Folder(folder) => &folder.id,
            Self::File(file) => &file.id,
        }
    }
}
impl From<Folder> for Entity {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}
impl From<File> for Entity {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}

/// Addresses an item in the hierarchy, or the desired location of one.
///
/// - folder only: the folder itself.
/// - folder and leaf: a file inside that folder, or (as a rename
///   destination) the desired parent and identifier.
/// - leaf only: an orphan file, or a desired identifier with the parent left
///   unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    pub folder: Option<EntityId>,
    pub leaf: Option<EntityId>,
}
impl Path {
    pub fn new(folder: Option<EntityId>, leaf: Option<EntityId>) -> Self {
        Self { folder, leaf }
    }

    /// Path of a folder.
    pub fn folder(folder: EntityId) -> Self {
        Self::new(Some(folder), None)
    }

    /// Path of a file listed in `folder`.
    pub fn file(folder: EntityId, file: EntityId) -> Self {
        Self::new(Some(folder), Some(file))
    }

    /// Path of a file without a (known) parent.
    pub fn orphan_file(file: EntityId) -> Self {
        Self::new(None, Some(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> EntityId {
        EntityId::new("Drive", name).unwrap()
    }

    #[test]
    fn test_reparent_swaps_membership() {
        let mut file = File::new(id("f"), "f.txt", *b"data").with_parent(id("p1")).with_parent(id("p2"));
        assert!(file.reparent(Some(&id("p1")), &id("p3")));
        assert_eq!(file.parents, BTreeSet::from([id("p2"), id("p3")]));
    }

    #[test]
    fn test_reparent_is_set_like() {
        let mut file = File::new(id("f"), "f.txt", *b"data").with_parent(id("p1")).with_parent(id("p2"));
        // Moving from p1 to p2 only drops p1: no duplicate membership.
        assert!(file.reparent(Some(&id("p1")), &id("p2")));
        assert_eq!(file.parents, BTreeSet::from([id("p2")]));
        // Nothing left to change.
        assert!(!file.reparent(Some(&id("p1")), &id("p2")));
    }

    #[test]
    fn test_primary_parent_is_derived() {
        let file = File::new(id("f"), "f.txt", b"".to_vec()).with_parent(id("b")).with_parent(id("a"));
        assert_eq!(file.primary_parent(), Some(&id("a")));
        assert_eq!(File::new(id("g"), "g", b"".to_vec()).primary_parent(), None);
    }

    #[test]
    fn test_entity_id() {
        let entity: Entity = Folder::new(id("folder"), "Folder", None).into();
        assert_eq!(entity.id(), &id("folder"));
    }

    #[test]
    fn test_path_constructors() {
        assert_eq!(Path::folder(id("a")), Path { folder: Some(id("a")), leaf: None });
        assert_eq!(Path::file(id("a"), id("f")), Path { folder: Some(id("a")), leaf: Some(id("f")) });
        assert_eq!(Path::orphan_file(id("f")), Path { folder: None, leaf: Some(id("f")) });
    }
}
