//! Scoped zip mounts.
//!
//! An [`ArchiveMount`] owns an open [`zip::ZipArchive`] for as long as one
//! lookup needs it. Nothing is cached between resolutions; the mount (and
//! the file or buffer under it) is released when it is dropped.

use std::fmt;
use std::io::{Cursor, Read, Seek};

use layerfs_types::VPath;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{FsError, FsResult};

/// Upper bound on the buffer reserved from a member's declared size.
const PREALLOC_LIMIT: usize = 1 << 20;

/// Anything a zip can be read from.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// An open archive, addressed by member path.
pub struct ArchiveMount {
    archive: ZipArchive<Box<dyn ReadSeek>>,
    origin: String,
}

impl ArchiveMount {
    /// Mount an archive from any seekable reader.
    ///
    /// `origin` names the archive in errors and logs.
    pub fn new(reader: Box<dyn ReadSeek>, origin: impl Into<String>) -> FsResult<Self> {
        let origin = origin.into();
        let archive = ZipArchive::new(reader)
            .map_err(|e| FsError::archive(format!("{origin}: {e}")))?;
        tracing::trace!(archive = %origin, members = archive.len(), "mounted archive");
        Ok(Self { archive, origin })
    }

    /// Mount an archive held in memory.
    pub fn from_bytes(bytes: &'static [u8], origin: impl Into<String>) -> FsResult<Self> {
        Self::new(Box::new(Cursor::new(bytes)), origin)
    }

    /// Name of the mounted archive.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Number of members, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Returns true if the archive has no members.
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Member names as stored in the archive.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.archive.file_names()
    }

    /// Read one regular member completely.
    ///
    /// `Ok(None)` when the archive has no such member, or when the name only
    /// denotes a directory inside it. A member that is present but cannot be
    /// decompressed is an error.
    pub fn read_member(&mut self, member: &VPath) -> FsResult<Option<Vec<u8>>> {
        if member.is_empty() {
            return Ok(None);
        }
        let name = member.to_string();
        let mut entry = match self.archive.by_name(&name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(FsError::archive(format!("{}: {name}: {e}", self.origin))),
        };
        if entry.is_dir() {
            return Ok(None);
        }

        // Declared sizes come from the archive and are not trusted.
        let hint = usize::try_from(entry.size()).map_or(0, |n| n.min(PREALLOC_LIMIT));
        let mut buf = Vec::with_capacity(hint);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| FsError::archive(format!("{}: {name}: {e}", self.origin)))?;
        Ok(Some(buf))
    }
}

impl fmt::Debug for ArchiveMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveMount")
            .field("origin", &self.origin)
            .field("members", &self.archive.len())
            .finish()
    }
}
