//! Storage port and implementations.
//!
//! This module defines the [`Store`] trait: the only way folders and files
//! are read, created, changed or removed. The hierarchy logic never holds
//! authoritative state; every read goes through a store and every change is
//! persisted immediately.

#[cfg(any(test, feature = "mock"))]
mod memory;

#[cfg(any(test, feature = "mock"))]
pub use self::memory::MemoryStore;
use crate::error::Result;
use crate::{Entity, EntityId, File, Folder};
use async_trait::async_trait;

/// Unified interface to the document store holding the hierarchy.
///
/// Permission predicates are evaluated by the store against whatever actor it
/// was created for; callers only consume the yes/no answer.
///
/// # Relations
/// - A [`Folder`]'s parent pointer and a [`File`]'s parent set are the
///   persisted relations; child lists are derived by the store when a folder
///   is read.
/// - [`rename()`](Self::rename) keeps an entity's *own* relations but does
///   not touch other entities pointing at it. Callers re-point those.
///
/// # Examples
///
/// ```
/// use grove_store::{EntityId, Store, error::Result};
///
/// async fn display_name(store: &dyn Store, id: &EntityId) -> Result<Option<String>> {
///     if let Some(folder) = store.folder(id).await? {
///         return Ok(Some(folder.name));
///     }
///     Ok(store.file(id).await?.map(|file| file.name))
/// }
/// ```
#[async_trait]
pub trait Store: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Check if a folder or file exists under this identifier.
    async fn exists(&self, id: &EntityId) -> Result<bool>;

    /// Fetch a folder, including a fresh snapshot of its children.
    ///
    /// Returns `Ok(None)` if there is no folder with this identifier.
    async fn folder(&self, id: &EntityId) -> Result<Option<Folder>>;

    /// Fetch a file.
    ///
    /// Returns `Ok(None)` if there is no file with this identifier.
    async fn file(&self, id: &EntityId) -> Result<Option<File>>;

    /// Create or update an entity, persisting its current field values.
    async fn save(&self, entity: Entity) -> Result<()>;

    /// Remove an entity permanently.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the entity
    /// does not exist.
    async fn delete(&self, id: &EntityId) -> Result<()>;

    /// Atomically change an entity's identifier.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if `from` does
    /// not exist and [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists)
    /// if `to` is taken.
    async fn rename(&self, from: &EntityId, to: &EntityId) -> Result<()>;

    /// May the current actor edit (or create) the entity at `id`?
    async fn can_edit(&self, id: &EntityId) -> Result<bool>;

    /// May the current actor delete the entity at `id`?
    async fn can_delete(&self, id: &EntityId) -> Result<bool>;
}
