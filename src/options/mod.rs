//! Viewer, lifecycle and source options with TOML preset support.
//!
//! Options serialize to/from TOML so a deployment can keep its viewer
//! presets next to its other configuration.

mod lifecycle;
mod sources;
mod viewer;

use std::path::Path;

pub use lifecycle::LifecycleOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use sources::SourcesOptions;
pub use viewer::{ViewerOptions, DEFAULT_ROCK_SPEED, DEFAULT_SPIN_SPEED};

use crate::error::MolmountError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[viewer]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Presentation of mounted viewers.
    pub viewer: ViewerOptions,
    /// Idle viewer collection.
    pub lifecycle: LifecycleOptions,
    /// Model download locations.
    #[schemars(skip)]
    pub sources: SourcesOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Unreadable file or malformed TOML.
    pub fn load(path: &Path) -> Result<Self, MolmountError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Malformed TOML, including invalid colors.
    pub fn from_toml(content: &str) -> Result<Self, MolmountError> {
        toml::from_str(content)
            .map_err(|e| MolmountError::OptionsParse(e.to_string()))
    }

    /// Render as pretty-printed TOML.
    ///
    /// # Errors
    ///
    /// Values TOML cannot represent.
    pub fn to_toml(&self) -> Result<String, MolmountError> {
        toml::to_string_pretty(self)
            .map_err(|e| MolmountError::OptionsParse(e.to_string()))
    }

    /// Write to `path` as TOML, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Serialization or I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), MolmountError> {
        let content = self.to_toml()?;
        if let Some(parent) =
            path.parent().filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(std::fs::write(path, content)?)
    }

    /// Names of the `*.toml` presets directly inside `dir`, sorted. An
    /// unreadable directory has no presets.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .filter_map(|path| {
                path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
            })
            .collect();
        names.sort_unstable();
        names
    }
}
