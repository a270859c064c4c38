//! Configuration loading and validation.
//!
//! Sources are layered with [`figment`], later sources overriding earlier
//! ones:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. An optional configuration file; the format is picked from the
//!    extension (`.toml`, `.yaml`/`.yml` or `.json`).
//! 3. Environment variables prefixed with `GROVE_`, using `__` to separate
//!    nested keys (e.g. `GROVE_UNIQUIFIER__SEPARATOR=_`).
//!
//! # Example
//!
//! ```toml
//! [planner]
//! interactive = true
//!
//! [uniquifier]
//! separator = "_"
//! first_suffix = 2
//! max_attempts = 500
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "GROVE_";
const FILE_NAME: &str = "grove.toml";

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub planner: PlannerConfig,
    pub uniquifier: UniquifierConfig,
}

/// Settings for move/rename requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Ask before overwriting a file with the same name, instead of always
    /// keeping the existing file. Requests may still override this.
    pub interactive: bool,
}

/// Settings for identifier generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniquifierConfig {
    /// Placed between a taken name and its numeric suffix.
    pub separator: String,
    /// Smallest suffix tried. Must be positive.
    pub first_suffix: u32,
    /// Suffixes tried before giving up.
    pub max_attempts: u32,
}
impl Default for UniquifierConfig {
    fn default() -> Self {
        Self {
            separator: "-".to_string(),
            first_suffix: 1,
            max_attempts: 10_000,
        }
    }
}

impl Config {
    /// Platform-specific location of the user's configuration file, if a home
    /// directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "grove").map(|dirs| dirs.config_dir().join(FILE_NAME))
    }

    /// Load and validate the configuration.
    ///
    /// When `path` is `None` the [default path](Self::default_path) is used
    /// if that file exists. An explicitly given file must exist.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };
        if let Some(path) = &path {
            tracing::debug!(path = %path.display(), "Loading configuration file");
        }
        let config: Self = Self::figment(path.as_deref())?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()
    }

    /// Builds the layered [`Figment`] without extracting it.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                exn::bail!(ErrorKind::Load);
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Rejects values that cannot work.
    pub fn validate(self) -> Result<Self> {
        if self.uniquifier.separator.is_empty() {
            exn::bail!(ErrorKind::Invalid("uniquifier.separator must not be empty"));
        }
        if self.uniquifier.separator.contains('/') {
            exn::bail!(ErrorKind::Invalid("uniquifier.separator must not contain '/'"));
        }
        if self.uniquifier.max_attempts == 0 {
            exn::bail!(ErrorKind::Invalid("uniquifier.max_attempts must be greater than zero"));
        }
        if self.uniquifier.first_suffix == 0 {
            exn::bail!(ErrorKind::Invalid("uniquifier.first_suffix must be greater than zero"));
        }
        Ok(self)
    }
}
