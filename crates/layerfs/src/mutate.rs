//! Mutations inside the write root, and batch archive registration.

use layerfs_types::{AccessIntent, EntryKind, IntoVPath, Location, VPath};

use crate::error::{FsError, FsResult};
use crate::fs::LayerFs;
use crate::handle::FileHandle;

impl LayerFs {
    /// Create a directory and any missing parents inside the write root.
    #[tracing::instrument(skip(self, path), name = "layerfs.create_directory")]
    pub fn create_directory(&self, path: impl IntoVPath) -> FsResult<()> {
        let target = self.sandboxed(&self.checked(path)?)?;
        self.external.create_dir_all(&target)?;
        tracing::debug!(path = %target, "directory created");
        Ok(())
    }

    /// Create an empty file inside the write root.
    ///
    /// The parent directory must exist. If the file is already there it is
    /// left untouched and a handle to it is returned, as with
    /// [`open`](Self::open) for writing.
    #[tracing::instrument(skip(self, path), name = "layerfs.create_file")]
    pub fn create_file(&self, path: impl IntoVPath) -> FsResult<FileHandle> {
        let path = self.checked(path)?;
        let target = self.sandboxed(&path)?;
        match self.external.create_file(&target) {
            Ok(full) => {
                tracing::debug!(path = %target, "file created");
                Ok(FileHandle::disk(full, true))
            }
            Err(FsError::AlreadyExists(_)) => {
                tracing::debug!(path = %target, "file exists, attaching");
                self.open(path, AccessIntent::Write)
            }
            Err(e) => Err(e),
        }
    }

    /// Remove a file or an empty directory inside the write root.
    #[tracing::instrument(skip(self, path), name = "layerfs.delete")]
    pub fn delete(&self, path: impl IntoVPath) -> FsResult<()> {
        let target = self.removal_target(path)?;
        self.external.remove(&target)?;
        tracing::debug!(path = %target, "deleted");
        Ok(())
    }

    /// Remove a file or a whole directory tree inside the write root.
    ///
    /// Not atomic: on [`FsError::PartialDelete`] whatever was removed stays
    /// removed.
    #[tracing::instrument(skip(self, path), name = "layerfs.force_delete")]
    pub fn force_delete(&self, path: impl IntoVPath) -> FsResult<()> {
        let target = self.removal_target(path)?;
        self.external.remove_tree(&target)?;
        tracing::debug!(path = %target, "deleted recursively");
        Ok(())
    }

    fn removal_target(&self, path: impl IntoVPath) -> FsResult<VPath> {
        let path = self.checked(path)?;
        if path.is_empty() {
            return Err(FsError::invalid_path("refusing to remove the write root itself"));
        }
        self.sandboxed(&path)
    }

    /// Register every archive directly inside `path`.
    ///
    /// Only immediate children are considered, and only those that really
    /// are archives in the store. Returns how many were registered. If any
    /// registration fails the rest still go ahead, and the failures come back
    /// as [`FsError::PartialRegistration`].
    #[tracing::instrument(skip(self, path), name = "layerfs.add_all_archives")]
    pub fn add_all_archives_to_search_path(
        &self,
        path: impl IntoVPath,
        location: Location,
    ) -> FsResult<usize> {
        let dir = self.checked(path)?;
        let store = self.store(location);
        if !store.is_dir(&dir) {
            return Err(if store.exists(&dir) {
                FsError::not_a_directory(store.describe(&dir))
            } else {
                FsError::not_found(store.describe(&dir))
            });
        }

        let mut registered = 0;
        let mut failed = Vec::new();
        for child in store.list(&dir)? {
            if self.oracle().actual_kind(store, &child) != Some(EntryKind::Archive) {
                continue;
            }
            match self.register_search_path(&child, location) {
                Ok(()) => registered += 1,
                Err(e) => {
                    tracing::debug!(path = %child, error = %e, "archive not registered");
                    failed.push(child.to_string());
                }
            }
        }

        if failed.is_empty() {
            tracing::debug!(dir = %dir, %location, registered, "archives registered");
            Ok(registered)
        } else {
            tracing::warn!(dir = %dir, %location, registered, failed = failed.len(), "some archives not registered");
            Err(FsError::PartialRegistration { registered, failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FsConfig;
    use crate::handle::HandleKind;
    use tempfile::TempDir;

    fn setup() -> (LayerFs, TempDir) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("w")).unwrap();
        let fs = LayerFs::new(FsConfig::new().with_external_root(dir.path())).unwrap();
        fs.set_write_root("w").unwrap();
        (fs, dir)
    }

    #[test]
    fn test_mutations_need_write_root() {
        let dir = TempDir::new().unwrap();
        let fs = LayerFs::new(FsConfig::new().with_external_root(dir.path())).unwrap();
        assert!(matches!(fs.create_directory("d"), Err(FsError::WriteRootUnset)));
        assert!(matches!(fs.create_file("f.txt"), Err(FsError::WriteRootUnset)));
        assert!(matches!(fs.delete("f.txt"), Err(FsError::WriteRootUnset)));
        assert!(matches!(fs.force_delete("d"), Err(FsError::WriteRootUnset)));
    }

    #[test]
    fn test_create_directory_chain() {
        let (fs, dir) = setup();
        fs.create_directory("a/b/c").unwrap();
        assert!(dir.path().join("w/a/b/c").is_dir());
        fs.create_directory("a/b/c").unwrap();
    }

    #[test]
    fn test_create_file() {
        let (fs, dir) = setup();
        let handle = fs.create_file("new.txt").unwrap();
        assert_eq!(handle.kind(), HandleKind::Disk);
        assert!(handle.is_writable());
        assert!(dir.path().join("w/new.txt").is_file());
    }

    #[test]
    fn test_create_file_existing_attaches() {
        let (fs, dir) = setup();
        std::fs::write(dir.path().join("w/keep.txt"), "kept").unwrap();

        let created = fs.create_file("keep.txt").unwrap();
        let opened = fs.open("keep.txt", AccessIntent::Write).unwrap();
        assert_eq!(created.location(), opened.location());
        assert_eq!(created.read_string().unwrap(), "kept");
    }

    #[test]
    fn test_create_file_missing_parent() {
        let (fs, _dir) = setup();
        assert!(fs.create_file("nope/new.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_refuses_populated_directory() {
        let (fs, dir) = setup();
        fs.create_directory("d/e").unwrap();
        fs.create_file("d/e/f.txt").unwrap();

        assert!(matches!(fs.delete("d"), Err(FsError::DirectoryNotEmpty(_))));
        assert!(dir.path().join("w/d/e/f.txt").is_file());

        fs.force_delete("d").unwrap();
        assert!(!dir.path().join("w/d").exists());
        assert!(dir.path().join("w").is_dir());
    }

    #[test]
    fn test_delete_file_and_missing() {
        let (fs, dir) = setup();
        fs.create_file("f.txt").unwrap();
        fs.delete("f.txt").unwrap();
        assert!(!dir.path().join("w/f.txt").exists());
        assert!(fs.delete("f.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_write_root_itself_not_removable() {
        let (fs, _dir) = setup();
        assert!(matches!(fs.force_delete(""), Err(FsError::InvalidPath(_))));
        assert!(matches!(fs.delete("a/.."), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_unsafe_mutation_rejected() {
        let (fs, dir) = setup();
        std::fs::write(dir.path().join("outside.txt"), "x").unwrap();
        assert!(matches!(fs.delete("../outside.txt"), Err(FsError::UnsafePath(_))));
        assert!(matches!(fs.create_directory("x/../../y"), Err(FsError::UnsafePath(_))));
        assert!(dir.path().join("outside.txt").exists());
    }

    #[test]
    fn test_write_root_reassignment() {
        let (fs, dir) = setup();
        std::fs::create_dir(dir.path().join("w2")).unwrap();
        fs.create_file("one.txt").unwrap();
        fs.set_write_root("w2").unwrap();
        fs.create_file("two.txt").unwrap();
        assert!(dir.path().join("w/one.txt").exists());
        assert!(dir.path().join("w2/two.txt").exists());
        assert!(!dir.path().join("w2/one.txt").exists());
    }

    #[test]
    fn test_add_all_archives_depth_one() {
        let (fs, dir) = setup();
        let mods = dir.path().join("mods");
        std::fs::create_dir_all(mods.join("nested")).unwrap();
        std::fs::write(mods.join("a.zip"), b"").unwrap();
        std::fs::write(mods.join("b.ZIP"), b"").unwrap();
        std::fs::write(mods.join("readme.txt"), b"").unwrap();
        std::fs::write(mods.join("nested/deep.zip"), b"").unwrap();
        std::fs::create_dir(mods.join("folder.zip")).unwrap();

        assert_eq!(fs.add_all_archives_to_search_path("mods", Location::External).unwrap(), 2);
        assert!(fs.is_on_search_path("mods/a.zip"));
        assert!(fs.is_on_search_path("mods/b.ZIP"));
        assert!(!fs.is_on_search_path("mods/nested/deep.zip"));
        assert!(!fs.is_on_search_path("mods/folder.zip"));
        assert!(!fs.is_on_search_path("mods"));
    }

    #[test]
    fn test_add_all_archives_partial() {
        let (fs, dir) = setup();
        let mods = dir.path().join("mods");
        std::fs::create_dir(&mods).unwrap();
        std::fs::write(mods.join("a.zip"), b"").unwrap();
        std::fs::write(mods.join("b.zip"), b"").unwrap();
        fs.register_search_path("mods/a.zip", Location::External).unwrap();

        match fs.add_all_archives_to_search_path("mods", Location::External) {
            Err(FsError::PartialRegistration { registered, failed }) => {
                assert_eq!(registered, 1);
                assert_eq!(failed, vec!["mods/a.zip".to_string()]);
            }
            other => panic!("expected partial registration, got {other:?}"),
        }
        assert!(fs.is_on_search_path("mods/b.zip"));
        assert_eq!(fs.search_path().len(), 2);
    }

    #[test]
    fn test_add_all_archives_missing_dir() {
        let (fs, _dir) = setup();
        let err = fs.add_all_archives_to_search_path("nowhere", Location::External).unwrap_err();
        assert!(err.is_not_found());
    }
}
