//! External (real disk) store.

use std::fs::{self, File, OpenOptions};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use layerfs_types::{Location, VPath};
use walkdir::WalkDir;

use crate::archive::ArchiveMount;
use crate::error::{FsError, FsResult};
use crate::handle::FileHandle;
use crate::store::Store;

/// Real storage under a root directory.
///
/// Every logical path is joined onto `root` segment by segment. For example,
/// with `root` at `/srv/game`, `mods/coolmod.zip` is
/// `/srv/game/mods/coolmod.zip`.
#[derive(Debug, Clone)]
pub struct ExternalStore {
    root: PathBuf,
}

impl ExternalStore {
    /// Create a store rooted at `root`.
    ///
    /// The root is canonicalized when it exists, so concrete paths in logs
    /// and handles are stable (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self { root }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Concrete path for a logical one.
    ///
    /// Each segment must be exactly one path component. A segment that
    /// would replace the root (absolute, drive prefix) or span several
    /// components is rejected, whatever the caller checked before. Leading
    /// `..` is let through; the traversal policy decides on those.
    pub fn concrete(&self, path: &VPath) -> FsResult<PathBuf> {
        let mut full = self.root.clone();
        for segment in path {
            let mut components = Path::new(segment.as_str()).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_) | Component::ParentDir), None) => {
                    full.push(segment.as_str())
                }
                _ => {
                    tracing::warn!(path = %path, segment = %segment, "segment escapes store root");
                    return Err(FsError::unsafe_path(path));
                }
            }
        }
        Ok(full)
    }

    /// Create `path` and any missing ancestors.
    ///
    /// Succeeds only if a directory exists at `path` afterwards.
    pub fn create_dir_all(&self, path: &VPath) -> FsResult<()> {
        let full = self.concrete(path)?;
        fs::create_dir_all(&full).map_err(|e| FsError::from_io(e, &full))?;
        if full.is_dir() {
            Ok(())
        } else {
            Err(FsError::not_a_directory(full.display()))
        }
    }

    /// Create a new empty file. The parent must already exist.
    pub fn create_file(&self, path: &VPath) -> FsResult<PathBuf> {
        let full = self.concrete(path)?;
        if let Some(parent) = full.parent().filter(|p| !p.is_dir()) {
            return Err(FsError::not_found(parent.display()));
        }
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|e| FsError::from_io(e, &full))?;
        Ok(full)
    }

    /// Remove a file or an empty directory.
    pub fn remove(&self, path: &VPath) -> FsResult<()> {
        let full = self.concrete(path)?;
        let meta = fs::symlink_metadata(&full).map_err(|e| FsError::from_io(e, &full))?;
        if meta.is_dir() {
            let populated = fs::read_dir(&full)
                .map_err(|e| FsError::from_io(e, &full))?
                .next()
                .is_some();
            if populated {
                return Err(FsError::directory_not_empty(full.display()));
            }
            fs::remove_dir(&full).map_err(|e| FsError::from_io(e, &full))
        } else {
            fs::remove_file(&full).map_err(|e| FsError::from_io(e, &full))
        }
    }

    /// Remove `path` and everything under it.
    ///
    /// Files go first. Directories are only touched once every file is gone,
    /// deepest first, so a failure leaves the tree shape intact. Whatever
    /// could not be removed is listed in [`FsError::PartialDelete`]; what was
    /// removed stays removed.
    pub fn remove_tree(&self, path: &VPath) -> FsResult<()> {
        let full = self.concrete(path)?;
        let meta = fs::symlink_metadata(&full).map_err(|e| FsError::from_io(e, &full))?;
        if !meta.is_dir() {
            return fs::remove_file(&full).map_err(|e| FsError::from_io(e, &full));
        }

        let mut failed = Vec::new();
        let mut removed = 0usize;
        for entry in WalkDir::new(&full) {
            match entry {
                Ok(entry) if !entry.file_type().is_dir() => {
                    match fs::remove_file(entry.path()) {
                        Ok(()) => removed += 1,
                        Err(e) => {
                            tracing::debug!(path = %entry.path().display(), error = %e, "file removal failed");
                            failed.push(entry.into_path());
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| full.clone());
                    tracing::debug!(path = %at.display(), error = %e, "walk failed");
                    failed.push(at);
                }
            }
        }
        if !failed.is_empty() {
            tracing::warn!(path = %full.display(), removed, failed = failed.len(), "force delete stopped after file pass");
            return Err(FsError::PartialDelete { failed });
        }

        for entry in WalkDir::new(&full).contents_first(true) {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    if let Err(e) = fs::remove_dir(entry.path()) {
                        tracing::debug!(path = %entry.path().display(), error = %e, "directory removal failed");
                        failed.push(entry.into_path());
                    }
                }
                Ok(entry) => failed.push(entry.into_path()),
                Err(e) => {
                    failed.push(e.path().map(Path::to_path_buf).unwrap_or_else(|| full.clone()));
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            tracing::warn!(path = %full.display(), failed = failed.len(), "force delete left directories behind");
            Err(FsError::PartialDelete { failed })
        }
    }
}

impl Store for ExternalStore {
    fn location(&self) -> Location {
        Location::External
    }

    fn exists(&self, path: &VPath) -> bool {
        self.concrete(path).is_ok_and(|full| full.exists())
    }

    fn is_dir(&self, path: &VPath) -> bool {
        self.concrete(path).is_ok_and(|full| full.is_dir())
    }

    fn list(&self, path: &VPath) -> FsResult<Vec<VPath>> {
        let full = self.concrete(path)?;
        let mut children = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| FsError::from_io(e, &full))? {
            let entry = entry.map_err(|e| FsError::from_io(e, &full))?;
            match entry.file_name().into_string() {
                Ok(name) => children.push(path.append_segment(name)),
                Err(raw) => {
                    tracing::debug!(dir = %full.display(), name = ?raw, "skipping non UTF-8 entry");
                }
            }
        }
        children.sort();
        Ok(children)
    }

    fn open_handle(&self, path: &VPath) -> FsResult<FileHandle> {
        Ok(FileHandle::disk(self.concrete(path)?, false))
    }

    fn open_archive(&self, path: &VPath) -> FsResult<ArchiveMount> {
        let full = self.concrete(path)?;
        let file = File::open(&full).map_err(|e| FsError::from_io(e, &full))?;
        ArchiveMount::new(Box::new(BufReader::new(file)), full.display().to_string())
    }

    fn describe(&self, path: &VPath) -> String {
        match self.concrete(path) {
            Ok(full) => full.display().to_string(),
            Err(_) => format!("{}:{path}", self.root.display()),
        }
    }
}
