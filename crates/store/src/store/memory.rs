//! In-memory store for testing.

use crate::error::{ErrorKind, Result};
use crate::{Entity, EntityId, File, Folder, Store};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

/// In-memory store for testing.
///
/// Entities are kept in a `BTreeMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation, and derived child
/// lists come out in identifier order. Permissions are granted for everything
/// except identifiers explicitly denied with [`deny_edit`](Self::deny_edit) or
/// [`deny_delete`](Self::deny_delete).
///
/// # Examples
///
/// ```
/// use grove_store::{EntityId, File, Folder, Store, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = EntityId::new("Drive", "root")?;
/// let doc = EntityId::new("Drive", "doc")?;
/// let store = MemoryStore::with_entities([
///     Folder::new(root.clone(), "Root", None).into(),
///     File::new(doc.clone(), "doc.txt", *b"hello").with_parent(root.clone()).into(),
/// ]);
///
/// let folder = store.folder(&root).await?.unwrap();
/// assert_eq!(folder.child_files, vec![doc]);
/// # Ok(())
/// # }
/// ```
pub struct MemoryStore {
    name: String,
    entities: RwLock<BTreeMap<EntityId, Entity>>,
    deny_edit: BTreeSet<EntityId>,
    deny_delete: BTreeSet<EntityId>,
}

impl MemoryStore {
    /// Create a store pre-populated with entities.
    ///
    /// Child lists on the given folders are ignored; they are always derived
    /// from parent relations.
    pub fn with_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let entities = entities.into_iter().map(|entity| (entity.id().clone(), Self::stripped(entity))).collect();
        Self {
            name: "memory".to_string(),
            entities: RwLock::new(entities),
            deny_edit: BTreeSet::new(),
            deny_delete: BTreeSet::new(),
        }
    }

    /// Change the name of the store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Refuse edit permission on `id`.
    pub fn deny_edit(mut self, id: EntityId) -> Self {
        self.deny_edit.insert(id);
        self
    }

    /// Refuse delete permission on `id`.
    pub fn deny_delete(mut self, id: EntityId) -> Self {
        self.deny_delete.insert(id);
        self
    }

    /// Number of stored entities of both kinds.
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }

    fn stripped(entity: Entity) -> Entity {
        match entity {
            Entity::Folder(folder) => Entity::Folder(Folder::new(folder.id, folder.name, folder.parent)),
            file => file,
        }
    }
}
impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_entities([])
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, id: &EntityId) -> Result<bool> {
        Ok(self.entities.read().await.contains_key(id))
    }

    async fn folder(&self, id: &EntityId) -> Result<Option<Folder>> {
        let guard = self.entities.read().await;
        let Some(Entity::Folder(folder)) = guard.get(id) else {
            return Ok(None);
        };
        let mut folder = folder.clone();
        for entity in guard.values() {
            match entity {
                Entity::Folder(child) if child.parent.as_ref() == Some(id) => folder.child_folders.push(child.id.clone()),
                Entity::File(child) if child.parents.contains(id) => folder.child_files.push(child.id.clone()),
                _ => {},
            }
        }
        Ok(Some(folder))
    }

    async fn file(&self, id: &EntityId) -> Result<Option<File>> {
        match self.entities.read().await.get(id) {
            Some(Entity::File(file)) => Ok(Some(file.clone())),
            _ => Ok(None),
        }
    }

    async fn save(&self, entity: Entity) -> Result<()> {
        self.entities.write().await.insert(entity.id().clone(), Self::stripped(entity));
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> Result<()> {
        self.entities
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(id.clone())))
    }

    async fn rename(&self, from: &EntityId, to: &EntityId) -> Result<()> {
        let mut guard = self.entities.write().await;
        if guard.contains_key(to) {
            exn::bail!(ErrorKind::AlreadyExists(to.clone()));
        }
        let entity = match guard.remove(from).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(from.clone())))? {
            Entity::Folder(mut folder) => {
                folder.id = to.clone();
                Entity::Folder(folder)
            },
            Entity::File(mut file) => {
                file.id = to.clone();
                Entity::File(file)
            },
        };
        guard.insert(to.clone(), entity);
        Ok(())
    }

    async fn can_edit(&self, id: &EntityId) -> Result<bool> {
        Ok(!self.deny_edit.contains(id))
    }

    async fn can_delete(&self, id: &EntityId) -> Result<bool> {
        Ok(!self.deny_delete.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> EntityId {
        EntityId::new("Drive", name).unwrap()
    }

    fn fixture() -> MemoryStore {
        MemoryStore::with_entities([
            Folder::new(id("root"), "Root", None).into(),
            Folder::new(id("a"), "A", Some(id("root"))).into(),
            Folder::new(id("b"), "B", Some(id("root"))).into(),
            File::new(id("f1"), "one.txt", *b"1").with_parent(id("a")).into(),
            File::new(id("f2"), "two.txt", *b"2").with_parent(id("a")).with_parent(id("b")).into(),
        ])
    }

    #[tokio::test]
    async fn test_children_are_derived() {
        let store = fixture();
        let root = store.folder(&id("root")).await.unwrap().unwrap();
        assert_eq!(root.child_folders, vec![id("a"), id("b")]);
        assert!(root.child_files.is_empty());
        let b = store.folder(&id("b")).await.unwrap().unwrap();
        assert_eq!(b.child_files, vec![id("f2")]);
    }

    #[tokio::test]
    async fn test_saved_children_are_ignored() {
        let store = MemoryStore::default();
        let mut folder = Folder::new(id("x"), "X", None);
        folder.child_files.push(id("ghost"));
        store.save(folder.into()).await.unwrap();
        assert!(store.folder(&id("x")).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_none() {
        let store = fixture();
        assert!(store.folder(&id("f1")).await.unwrap().is_none());
        assert!(store.file(&id("a")).await.unwrap().is_none());
        assert!(store.exists(&id("f1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = fixture();
        store.delete(&id("f1")).await.unwrap();
        assert!(!store.exists(&id("f1")).await.unwrap());
        // Delete nonexistent → NotFound
        let err = store.delete(&id("f1")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_keeps_own_relations_only() {
        let store = fixture();
        store.rename(&id("a"), &id("a2")).await.unwrap();
        let renamed = store.folder(&id("a2")).await.unwrap().unwrap();
        assert_eq!(renamed.parent, Some(id("root")));
        // Files still point at the old identifier until re-pointed.
        assert!(renamed.child_files.is_empty());
        assert!(store.file(&id("f1")).await.unwrap().unwrap().parents.contains(&id("a")));
    }

    #[tokio::test]
    async fn test_rename_errors() {
        let store = fixture();
        let err = store.rename(&id("missing"), &id("new")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = store.rename(&id("a"), &id("b")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert!(store.exists(&id("a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_permissions() {
        let store = fixture().deny_edit(id("a")).deny_delete(id("f1"));
        assert!(!store.can_edit(&id("a")).await.unwrap());
        assert!(store.can_delete(&id("a")).await.unwrap());
        assert!(!store.can_delete(&id("f1")).await.unwrap());
        assert!(store.can_edit(&id("not-yet-created")).await.unwrap());
    }

    #[tokio::test]
    async fn test_len() {
        assert_eq!(fixture().len().await, 5);
        assert!(MemoryStore::default().is_empty().await);
    }
}
