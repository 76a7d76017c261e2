//! Overlay configuration.
//!
//! Loaded from TOML or built in code:
//!
//! ```toml
//! external_root = "/srv/game"
//! archive_extensions = ["zip", "pak"]
//! traversal = "reject"
//! ```

use std::path::{Path, PathBuf};

use layerfs_types::TraversalPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating an [`FsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid archive extension {0:?}")]
    InvalidExtension(String),
}

/// Configuration for a [`LayerFs`](crate::LayerFs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Directory EXTERNAL paths are resolved against.
    pub external_root: PathBuf,
    /// File suffixes (without the dot) that mark a file as an archive.
    pub archive_extensions: Vec<String>,
    /// How `..` segments that survive normalization are treated.
    pub traversal: TraversalPolicy,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            external_root: PathBuf::from("."),
            archive_extensions: vec!["zip".to_string()],
            traversal: TraversalPolicy::default(),
        }
    }
}

impl FsConfig {
    /// Default configuration: working directory, `.zip` archives, reject `..`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the external root.
    pub fn with_external_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.external_root = root.into();
        self
    }

    /// Replace the archive extension list.
    pub fn with_archive_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.archive_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the traversal policy.
    pub fn with_traversal(mut self, traversal: TraversalPolicy) -> Self {
        self.traversal = traversal;
        self
    }

    /// Parse from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FsConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the extension list.
    ///
    /// Extensions are bare suffixes: non-empty, no leading dot, no separator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for ext in &self.archive_extensions {
            if ext.is_empty() || ext.starts_with('.') || ext.contains('/') {
                return Err(ConfigError::InvalidExtension(ext.clone()));
            }
        }
        Ok(())
    }
}
