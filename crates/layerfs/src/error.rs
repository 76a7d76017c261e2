//! Overlay filesystem error types.

use std::io;
use std::path::{Path, PathBuf};

use layerfs_types::PathError;
use thiserror::Error;

use crate::config::ConfigError;

/// Overlay filesystem error type.
///
/// Every expected failure of an operation comes back as one of these;
/// nothing in the library panics on bad input or missing files.
#[derive(Debug, Error)]
pub enum FsError {
    /// Malformed path input (bad slice range, empty divider).
    #[error("invalid path input: {0}")]
    Path(#[from] PathError),

    /// Path still climbs out of its root after normalization.
    #[error("unsafe path: {0}")]
    UnsafePath(String),

    /// Nothing found at the path, in any binding.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The (path, location) pair is already on the search path.
    #[error("already on the search path: {0}")]
    AlreadyRegistered(String),

    /// A mutation was attempted before a write root was set.
    #[error("no write root has been set")]
    WriteRootUnset,

    /// Directory not empty.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Path is well-formed but not acceptable for this operation.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Handle is read-only.
    #[error("file handle is read-only")]
    ReadOnly,

    /// Archive could not be mounted or a member could not be read.
    #[error("archive error: {0}")]
    Archive(String),

    /// Force delete removed some entries but not all of them.
    #[error("{} entries could not be removed", failed.len())]
    PartialDelete { failed: Vec<PathBuf> },

    /// Batch registration added some archives but not all of them.
    #[error("registered {registered} archives, {} failed", failed.len())]
    PartialRegistration {
        registered: usize,
        failed: Vec<String>,
    },

    /// Bad configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FsError {
    /// Create an UnsafePath error.
    pub fn unsafe_path(path: impl ToString) -> Self {
        Self::UnsafePath(path.to_string())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound(path.to_string())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl ToString) -> Self {
        Self::AlreadyExists(path.to_string())
    }

    /// Create an AlreadyRegistered error.
    pub fn already_registered(path: impl ToString) -> Self {
        Self::AlreadyRegistered(path.to_string())
    }

    /// Create a DirectoryNotEmpty error.
    pub fn directory_not_empty(path: impl ToString) -> Self {
        Self::DirectoryNotEmpty(path.to_string())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl ToString) -> Self {
        Self::NotADirectory(path.to_string())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl ToString) -> Self {
        Self::IsADirectory(path.to_string())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create an Archive error.
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Classify an I/O error against the concrete path it happened on.
    ///
    /// Kinds the overlay reports distinctly get their own variant; the rest
    /// stay wrapped so the cause is kept for diagnostics.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let shown = path.display();
        match err.kind() {
            io::ErrorKind::NotFound => Self::not_found(shown),
            io::ErrorKind::AlreadyExists => Self::already_exists(shown),
            io::ErrorKind::DirectoryNotEmpty => Self::directory_not_empty(shown),
            io::ErrorKind::NotADirectory => Self::not_a_directory(shown),
            io::ErrorKind::IsADirectory => Self::is_a_directory(shown),
            _ => Self::Io(err),
        }
    }

    /// Returns true for "nothing there" errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

impl From<zip::result::ZipError> for FsError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => FsError::Io(io),
            other => FsError::Archive(other.to_string()),
        }
    }
}

/// Convert FsError to std::io::Error for compatibility.
impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        match e {
            FsError::Path(err) => io::Error::new(io::ErrorKind::InvalidInput, err),
            FsError::UnsafePath(msg) => io::Error::new(io::ErrorKind::PermissionDenied, msg),
            FsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            FsError::AlreadyExists(msg) | FsError::AlreadyRegistered(msg) => {
                io::Error::new(io::ErrorKind::AlreadyExists, msg)
            }
            FsError::WriteRootUnset => {
                io::Error::new(io::ErrorKind::NotFound, "no write root has been set")
            }
            FsError::DirectoryNotEmpty(msg) => {
                io::Error::new(io::ErrorKind::DirectoryNotEmpty, msg)
            }
            FsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            FsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            FsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            FsError::ReadOnly => {
                io::Error::new(io::ErrorKind::PermissionDenied, "file handle is read-only")
            }
            FsError::Archive(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
            e @ (FsError::PartialDelete { .. } | FsError::PartialRegistration { .. }) => {
                io::Error::other(e.to_string())
            }
            FsError::Config(err) => io::Error::new(io::ErrorKind::InvalidInput, err),
            FsError::Io(e) => e,
        }
    }
}

/// Overlay filesystem result type.
pub type FsResult<T> = Result<T, FsError>;
