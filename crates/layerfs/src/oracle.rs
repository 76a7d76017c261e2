//! Entry classification.
//!
//! Two answers to "what is this entry": a guess from the name alone, used
//! at registration time when the entry may not exist yet, and the real
//! answer from a store.

use glob::{MatchOptions, Pattern};
use layerfs_types::{EntryKind, VPath};

use crate::config::ConfigError;
use crate::store::Store;

const MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Classifies paths as files, directories or archives.
#[derive(Debug, Clone)]
pub struct TypeOracle {
    suffixes: Vec<String>,
    patterns: Vec<Pattern>,
}

impl TypeOracle {
    /// Oracle treating the given extensions (without dots) as archives.
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Result<Self, ConfigError> {
        let mut suffixes = Vec::with_capacity(extensions.len());
        let mut patterns = Vec::with_capacity(extensions.len());
        for ext in extensions {
            let ext = ext.as_ref();
            if ext.is_empty() || ext.starts_with('.') {
                return Err(ConfigError::InvalidExtension(ext.to_string()));
            }
            let pattern = Pattern::new(&format!("*.{}", Pattern::escape(ext)))
                .map_err(|_| ConfigError::InvalidExtension(ext.to_string()))?;
            suffixes.push(format!(".{}", ext.to_ascii_lowercase()));
            patterns.push(pattern);
        }
        Ok(Self { suffixes, patterns })
    }

    /// Guess from the final segment's name only.
    ///
    /// Archive suffix ⇒ archive; any other dot ⇒ file; no dot ⇒ directory.
    /// The empty path names a root, so it is a directory.
    pub fn predict_kind(&self, path: &VPath) -> EntryKind {
        let Some(name) = path.file_name() else {
            return EntryKind::Directory;
        };
        let lower = name.as_str().to_ascii_lowercase();
        if self.suffixes.iter().any(|suffix| lower.ends_with(suffix.as_str())) {
            EntryKind::Archive
        } else if name.contains(".") {
            EntryKind::File
        } else {
            EntryKind::Directory
        }
    }

    /// Authoritative kind of `path` in `store`, or `None` if nothing is there.
    pub fn actual_kind(&self, store: &dyn Store, path: &VPath) -> Option<EntryKind> {
        if !store.exists(path) {
            return None;
        }
        if store.is_dir(path) {
            return Some(EntryKind::Directory);
        }
        let is_archive = path
            .file_name()
            .is_some_and(|name| self.patterns.iter().any(|p| p.matches_with(name.as_str(), MATCH)));
        Some(if is_archive {
            EntryKind::Archive
        } else {
            EntryKind::File
        })
    }
}
