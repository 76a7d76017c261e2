//! Backing stores.
//!
//! A store turns a logical [`VPath`] into something concrete for one
//! [`Location`]: a directory tree on disk for EXTERNAL, a tree compiled into
//! the binary for INTERNAL. The resolver only talks to stores through the
//! [`Store`] trait; writes go straight to [`ExternalStore`], the only store
//! that can hold a write root.

mod bundled;
mod external;

pub use bundled::BundledStore;
pub use external::ExternalStore;

use layerfs_types::{Location, VPath};

use crate::archive::ArchiveMount;
use crate::error::FsResult;
use crate::handle::FileHandle;

/// Read-side operations every location supports.
///
/// Paths are relative to the store's root and already normalized and
/// checked by the caller.
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Location this store serves.
    fn location(&self) -> Location;

    /// Returns true if anything exists at `path`.
    fn exists(&self, path: &VPath) -> bool;

    /// Returns true if `path` is a directory.
    fn is_dir(&self, path: &VPath) -> bool;

    /// Immediate children of the directory at `path`, as full paths,
    /// sorted by name.
    fn list(&self, path: &VPath) -> FsResult<Vec<VPath>>;

    /// Read-only handle bound to `path`.
    fn open_handle(&self, path: &VPath) -> FsResult<FileHandle>;

    /// Mount the archive stored at `path`.
    fn open_archive(&self, path: &VPath) -> FsResult<ArchiveMount>;

    /// Concrete location of `path`, for logs and errors.
    fn describe(&self, path: &VPath) -> String;
}
