//! Collision-free identifier generation.

use crate::error::{ErrorKind, Result};
use crate::{EntityId, StoreHandle};
use async_trait::async_trait;
use tracing::instrument;

/// Turns a desired identifier into one that is free within its drive.
///
/// Implementations must be side-effect free: nothing is reserved, so the
/// caller should persist under the returned identifier straight away.
#[async_trait]
pub trait Uniquifier: Send + Sync {
    async fn generate(&self, drive: &str, desired: &str) -> Result<EntityId>;
}

/// Appends the smallest free numeric suffix to a taken name.
///
/// `doc` stays `doc` while it is free, otherwise becomes `doc-1`, `doc-2`, ...
/// (with the default separator and first suffix).
pub struct SuffixUniquifier {
    store: StoreHandle,
    separator: String,
    first: u32,
    max_attempts: u32,
}

impl SuffixUniquifier {
    pub const DEFAULT_SEPARATOR: &'static str = "-";
    pub const DEFAULT_FIRST_SUFFIX: u32 = 1;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            separator: Self::DEFAULT_SEPARATOR.to_string(),
            first: Self::DEFAULT_FIRST_SUFFIX,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// First suffix tried once the desired name is taken. Zero counts as one.
    pub fn with_first_suffix(mut self, first: u32) -> Self {
        self.first = first.max(1);
        self
    }

    /// Upper bound on how many suffixes are tried before giving up with
    /// [`Exhausted`](ErrorKind::Exhausted).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

#[async_trait]
impl Uniquifier for SuffixUniquifier {
    #[instrument(skip(self), fields(store = self.store.name()))]
    async fn generate(&self, drive: &str, desired: &str) -> Result<EntityId> {
        let candidate = EntityId::new(drive, desired)?;
        if !self.store.exists(&candidate).await? {
            return Ok(candidate);
        }
        for n in (self.first..=u32::MAX).take(self.max_attempts as usize) {
            let suffixed = candidate.sibling(format!("{}{}{n}", candidate.name(), self.separator))?;
            if !self.store.exists(&suffixed).await? {
                tracing::debug!(desired, unique = %suffixed, "Desired identifier taken; using suffixed identifier");
                return Ok(suffixed);
            }
        }
        exn::bail!(ErrorKind::Exhausted(desired.to_string()))
    }
}
