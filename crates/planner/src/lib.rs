//! Move, rename, copy and delete planning for folder hierarchies.
//!
//! The entry points are [`plan`], [`copy`] and [`delete`]. Moves and copies
//! classify a [`Request`] and then walk every source item through the
//! [`Store`](grove_store::Store):
//!
//! - **Bulk move** - every source moves, unchanged in name, into an existing
//!   destination folder. Folders whose name is already taken in the
//!   destination are merged into the existing folder; files whose name is
//!   taken go through overwrite resolution.
//! - **Single rename** - one source is renamed and/or relocated to the
//!   destination's (folder, leaf) pair. Renames never merge or overwrite.
//!
//! Copies follow the same two modes but leave their sources in place.
//! Deletions take plain paths: a file path only removes the file from the
//! folder it names, while a folder path removes the whole subtree.
//!
//! Progress, overwrite questions and cancellation go through a [`Job`].

mod conflict;
pub mod error;
mod job;
mod plan;
mod report;

pub use crate::job::{
    Job, JobStatus, OverwriteDecision, OverwriteQuestion, PendingQuestion, Progress, ProgressLevel, QuestionReceiver,
};
pub use crate::plan::{Request, copy, delete, plan};
pub use crate::report::{Mode, Operation, Report};
use grove_config::Config;
use grove_store::{Path, StoreHandle, SuffixUniquifier, UniquifierHandle};
use std::sync::Arc;

/// Shared collaborators for any number of requests.
#[derive(Clone)]
pub struct Context {
    pub store: StoreHandle,
    pub uniquifier: UniquifierHandle,
    /// Default for [`Request::interactive`].
    pub interactive: bool,
}
impl Context {
    /// A non-interactive context using a default [`SuffixUniquifier`].
    pub fn new(store: StoreHandle) -> Self {
        let uniquifier = Arc::new(SuffixUniquifier::new(store.clone()));
        Self { store, uniquifier, interactive: false }
    }

    pub fn from_config(store: StoreHandle, config: &Config) -> Self {
        let uniquifier = SuffixUniquifier::new(store.clone())
            .with_separator(config.uniquifier.separator.as_str())
            .with_first_suffix(config.uniquifier.first_suffix)
            .with_max_attempts(config.uniquifier.max_attempts);
        Self { store, uniquifier: Arc::new(uniquifier), interactive: config.planner.interactive }
    }

    pub fn with_uniquifier(mut self, uniquifier: UniquifierHandle) -> Self {
        self.uniquifier = uniquifier;
        self
    }

    /// A request inheriting this context's interactivity.
    pub fn request(&self, paths: Vec<Path>, destination: Path) -> Request {
        Request { paths, destination, interactive: self.interactive }
    }
}
