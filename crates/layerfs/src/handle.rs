//! File handles returned by resolution.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use layerfs_types::VPath;

use crate::error::{FsError, FsResult};

/// Where a [`FileHandle`] gets its bytes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
    /// A concrete path on external storage.
    Disk,
    /// A resource compiled into the host binary.
    Bundled,
    /// A member copied out of an archive.
    Snapshot,
}

#[derive(Clone)]
enum Backing {
    Disk(PathBuf),
    Bundled {
        path: VPath,
        /// `None` for directories.
        contents: Option<&'static [u8]>,
    },
    Snapshot {
        origin: String,
        bytes: Box<[u8]>,
    },
}

/// A resolved file.
///
/// Handles are plain values: they hold a path or a private copy of the
/// bytes, never an open descriptor. Every read returns a fresh buffer the
/// caller owns.
#[derive(Clone)]
pub struct FileHandle {
    backing: Backing,
    writable: bool,
}

impl FileHandle {
    /// Handle bound to a concrete path on disk.
    pub fn disk(path: impl Into<PathBuf>, writable: bool) -> Self {
        Self {
            backing: Backing::Disk(path.into()),
            writable,
        }
    }

    /// Read-only handle on a bundled resource. `None` contents mark a directory.
    pub fn bundled(path: VPath, contents: Option<&'static [u8]>) -> Self {
        Self {
            backing: Backing::Bundled { path, contents },
            writable: false,
        }
    }

    /// Read-only handle over bytes taken out of an archive.
    pub fn snapshot(origin: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            backing: Backing::Snapshot {
                origin: origin.into(),
                bytes: bytes.into_boxed_slice(),
            },
            writable: false,
        }
    }

    /// What backs this handle.
    pub fn kind(&self) -> HandleKind {
        match self.backing {
            Backing::Disk(_) => HandleKind::Disk,
            Backing::Bundled { .. } => HandleKind::Bundled,
            Backing::Snapshot { .. } => HandleKind::Snapshot,
        }
    }

    /// Concrete disk path, for disk handles.
    pub fn disk_path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::Disk(path) => Some(path),
            _ => None,
        }
    }

    /// Human-readable origin for diagnostics.
    pub fn location(&self) -> String {
        match &self.backing {
            Backing::Disk(path) => path.display().to_string(),
            Backing::Bundled { path, .. } => format!("bundled:{path}"),
            Backing::Snapshot { origin, .. } => origin.clone(),
        }
    }

    /// Whether writes through this handle can succeed.
    ///
    /// Disk handles also consult the backing file: an existing read-only
    /// file, or a missing parent directory, makes the handle unwritable.
    pub fn is_writable(&self) -> bool {
        if !self.writable {
            return false;
        }
        match &self.backing {
            Backing::Disk(path) => match std::fs::metadata(path) {
                Ok(meta) => meta.is_file() && !meta.permissions().readonly(),
                Err(_) => path.parent().is_some_and(Path::is_dir),
            },
            _ => false,
        }
    }

    /// Read the whole file.
    pub fn read_bytes(&self) -> FsResult<Vec<u8>> {
        match &self.backing {
            Backing::Disk(path) => std::fs::read(path).map_err(|e| FsError::from_io(e, path)),
            Backing::Bundled { path, contents } => contents
                .map(<[u8]>::to_vec)
                .ok_or_else(|| FsError::is_a_directory(path)),
            Backing::Snapshot { bytes, .. } => Ok(bytes.to_vec()),
        }
    }

    /// Read the whole file as text. Invalid UTF-8 is replaced.
    pub fn read_string(&self) -> FsResult<String> {
        let bytes = self.read_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write `data`, replacing the contents or appending to them.
    ///
    /// The file is created if it does not exist yet.
    pub fn write_bytes(&self, data: &[u8], append: bool) -> FsResult<()> {
        if !self.is_writable() {
            return Err(FsError::ReadOnly);
        }
        let Backing::Disk(path) = &self.backing else {
            return Err(FsError::ReadOnly);
        };

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let mut file = options.open(path).map_err(|e| FsError::from_io(e, path))?;
        file.write_all(data).map_err(|e| FsError::from_io(e, path))?;
        tracing::trace!(path = %path.display(), bytes = data.len(), append, "wrote file");
        Ok(())
    }

    /// Write text. See [`write_bytes`](Self::write_bytes).
    pub fn write_string(&self, text: &str, append: bool) -> FsResult<()> {
        self.write_bytes(text.as_bytes(), append)
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("kind", &self.kind())
            .field("location", &self.location())
            .field("writable", &self.writable)
            .finish()
    }
}
