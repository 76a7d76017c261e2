//! Bundled (compiled-in) store.

use include_dir::{Dir, DirEntry};
use layerfs_types::{Location, VPath};

use crate::archive::ArchiveMount;
use crate::error::{FsError, FsResult};
use crate::handle::FileHandle;
use crate::store::Store;

static EMPTY: Dir<'static> = Dir::new("", &[]);

/// Read-only resources embedded with `include_dir!`.
///
/// Backs the INTERNAL location. A host with nothing bundled gets an empty
/// tree, so every INTERNAL lookup misses.
#[derive(Debug, Clone, Copy)]
pub struct BundledStore {
    root: &'static Dir<'static>,
}

impl BundledStore {
    /// Store over an embedded tree.
    pub fn new(root: &'static Dir<'static>) -> Self {
        Self { root }
    }

    /// Store with nothing in it.
    pub fn empty() -> Self {
        Self { root: &EMPTY }
    }

    fn entry(&self, path: &VPath) -> Option<Node> {
        let mut dir = self.root;
        let mut segments = path.iter().peekable();
        while let Some(segment) = segments.next() {
            let found = dir.entries().iter().find(|entry| {
                entry
                    .path()
                    .file_name()
                    .is_some_and(|name| name.to_str() == Some(segment.as_str()))
            })?;
            match found {
                DirEntry::Dir(child) => dir = child,
                DirEntry::File(file) if segments.peek().is_none() => {
                    return Some(Node::File(file.contents()));
                }
                DirEntry::File(_) => return None,
            }
        }
        Some(Node::Dir(dir))
    }
}

impl Default for BundledStore {
    fn default() -> Self {
        Self::empty()
    }
}

enum Node {
    Dir(&'static Dir<'static>),
    File(&'static [u8]),
}

impl Store for BundledStore {
    fn location(&self) -> Location {
        Location::Internal
    }

    fn exists(&self, path: &VPath) -> bool {
        self.entry(path).is_some()
    }

    fn is_dir(&self, path: &VPath) -> bool {
        matches!(self.entry(path), Some(Node::Dir(_)))
    }

    fn list(&self, path: &VPath) -> FsResult<Vec<VPath>> {
        let dir = match self.entry(path) {
            Some(Node::Dir(dir)) => dir,
            Some(Node::File(_)) => return Err(FsError::not_a_directory(self.describe(path))),
            None => return Err(FsError::not_found(self.describe(path))),
        };
        let mut children: Vec<VPath> = dir
            .entries()
            .iter()
            .filter_map(|entry| entry.path().file_name())
            .filter_map(|name| match name.to_str() {
                Some(name) => Some(path.append_segment(name)),
                None => {
                    tracing::debug!(dir = %path, name = ?name, "skipping non UTF-8 entry");
                    None
                }
            })
            .collect();
        children.sort();
        Ok(children)
    }

    fn open_handle(&self, path: &VPath) -> FsResult<FileHandle> {
        match self.entry(path) {
            Some(Node::File(contents)) => Ok(FileHandle::bundled(path.clone(), Some(contents))),
            Some(Node::Dir(_)) => Ok(FileHandle::bundled(path.clone(), None)),
            None => Err(FsError::not_found(self.describe(path))),
        }
    }

    fn open_archive(&self, path: &VPath) -> FsResult<ArchiveMount> {
        match self.entry(path) {
            Some(Node::File(contents)) => ArchiveMount::from_bytes(contents, self.describe(path)),
            Some(Node::Dir(_)) => Err(FsError::is_a_directory(self.describe(path))),
            None => Err(FsError::not_found(self.describe(path))),
        }
    }

    fn describe(&self, path: &VPath) -> String {
        format!("bundled:{path}")
    }
}
