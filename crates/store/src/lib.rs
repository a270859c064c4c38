//! Folder/file hierarchy model and the storage port it lives behind.
//!
//! - **[`Folder`]**: single-parent container; folders form a forest.
//! - **[`File`]**: content-bearing entity listed in any number of folders.
//! - **[`Path`]**: addresses an item, or the desired location of one.
//! - **[`Store`]**: the port every read and every mutation goes through.
//! - **[`Uniquifier`]**: hands out collision-free identifiers.
//!
//! Enable the `mock` feature (in dev-dependencies) for [`MemoryStore`]. It is
//! always available to this crate's own tests.

pub mod error;
mod id;
mod models;
mod store;
mod uniquify;

pub use crate::id::EntityId;
pub use crate::models::{Entity, File, Folder, Path};
#[cfg(any(test, feature = "mock"))]
pub use crate::store::MemoryStore;
pub use crate::store::Store;
pub use crate::uniquify::{SuffixUniquifier, Uniquifier};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn Store + Send + Sync>;
pub type UniquifierHandle = Arc<dyn Uniquifier + Send + Sync>;
