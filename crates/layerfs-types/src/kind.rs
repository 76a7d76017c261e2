//! Location, access intent and entry kind enums.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Where a registered path lives.
///
/// Decides which backing store turns a logical path into something that can
/// be read: resources compiled into the host binary, or real storage.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Location {
    /// Bundled, read-only resources shipped with the host application.
    #[strum(serialize = "internal", serialize = "bundled")]
    Internal,
    /// Real storage, resolved against the configured external root.
    #[strum(serialize = "external", serialize = "disk")]
    External,
}

impl Location {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Internal => "internal",
            Location::External => "external",
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a file is being opened.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum AccessIntent {
    /// Search the registered bindings in priority order.
    Read,
    /// Bind into the write root, nowhere else.
    Write,
}

impl AccessIntent {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessIntent::Read => "read",
            AccessIntent::Write => "write",
        }
    }
}

impl std::fmt::Display for AccessIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an entry is, as far as the overlay cares.
///
/// An archive is a single file that carries its own nested namespace.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    #[strum(serialize = "directory", serialize = "dir")]
    Directory,
    /// Archive file (zip) mounted as a directory.
    Archive,
}

impl EntryKind {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Returns true if this is an archive.
    pub fn is_archive(&self) -> bool {
        matches!(self, EntryKind::Archive)
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Archive => "archive",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
