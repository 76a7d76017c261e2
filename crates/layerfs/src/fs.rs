//! The overlay filesystem.

use include_dir::Dir;
use layerfs_types::{AccessIntent, EntryKind, IntoVPath, Location, TraversalPolicy, VPath};
use parking_lot::RwLock;

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::handle::FileHandle;
use crate::oracle::TypeOracle;
use crate::registry::{Registry, SearchBinding};
use crate::store::{BundledStore, ExternalStore, Store};

/// A read-priority overlay over disk directories, bundled resources and
/// archives, with writes confined to one external directory.
///
/// `LayerFs` is `Send + Sync`. The registry sits behind a single lock;
/// reads work from a snapshot of it and never hold the lock across I/O.
///
/// # Example
///
/// ```no_run
/// use layerfs::{AccessIntent, FsConfig, LayerFs, Location};
///
/// # fn main() -> layerfs::FsResult<()> {
/// let fs = LayerFs::new(FsConfig::new().with_external_root("/srv/game"))?;
/// fs.register_search_path("mods/coolmod.zip", Location::External)?;
/// fs.register_search_path("assets", Location::External)?;
/// fs.set_write_root("saves")?;
///
/// let theme = fs.open("music/theme.ogg", AccessIntent::Read)?.read_bytes()?;
/// fs.create_file("slot1.sav")?.write_bytes(&theme[..4], false)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LayerFs {
    registry: RwLock<Registry>,
    oracle: TypeOracle,
    traversal: TraversalPolicy,
    pub(crate) external: ExternalStore,
    bundled: BundledStore,
}

impl LayerFs {
    /// Overlay with no bundled resources.
    pub fn new(config: FsConfig) -> FsResult<Self> {
        Self::build(config, BundledStore::empty())
    }

    /// Overlay whose INTERNAL location is the given embedded tree.
    pub fn with_bundled(config: FsConfig, bundle: &'static Dir<'static>) -> FsResult<Self> {
        Self::build(config, BundledStore::new(bundle))
    }

    fn build(config: FsConfig, bundled: BundledStore) -> FsResult<Self> {
        config.validate()?;
        let oracle = TypeOracle::new(&config.archive_extensions)?;
        let external = ExternalStore::new(config.external_root);
        tracing::debug!(root = %external.root().display(), traversal = ?config.traversal, "overlay created");
        Ok(Self {
            registry: RwLock::new(Registry::new(oracle.clone(), config.traversal)),
            oracle,
            traversal: config.traversal,
            external,
            bundled,
        })
    }

    /// Store serving `location`.
    pub fn store(&self, location: Location) -> &dyn Store {
        match location {
            Location::External => &self.external,
            Location::Internal => &self.bundled,
        }
    }

    /// The classifier this overlay uses.
    pub fn oracle(&self) -> &TypeOracle {
        &self.oracle
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Add a directory or archive at the lowest priority.
    pub fn register_search_path(&self, path: impl IntoVPath, location: Location) -> FsResult<()> {
        let path = path.into_vpath();
        let result = self.registry.write().register(&path, location);
        if let Err(FsError::UnsafePath(_)) = &result {
            tracing::warn!(path = %path, %location, "rejected unsafe search path");
        }
        result
    }

    /// Returns true if exactly this path is registered, under any location.
    pub fn is_on_search_path(&self, path: impl IntoVPath) -> bool {
        self.registry.read().contains(path)
    }

    /// Owned copy of the bindings, in priority order.
    pub fn search_path(&self) -> Vec<SearchBinding> {
        self.registry.read().bindings().to_vec()
    }

    /// Set the external directory all mutations are confined to.
    ///
    /// The directory does not need to exist. Reassigning affects later
    /// calls only.
    pub fn set_write_root(&self, path: impl IntoVPath) -> FsResult<()> {
        self.registry.write().set_write_root(path);
        Ok(())
    }

    /// Current write root.
    pub fn write_root(&self) -> Option<VPath> {
        self.registry.read().write_root().cloned()
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve `path` for reading or writing.
    ///
    /// READ searches the bindings in priority order and returns the first
    /// hit as a read-only handle; archive hits come back as in-memory
    /// snapshots. WRITE binds the path into the write root without checking
    /// that anything exists there yet.
    pub fn open(&self, path: impl IntoVPath, intent: AccessIntent) -> FsResult<FileHandle> {
        let path = self.checked(path)?;
        match intent {
            AccessIntent::Read => self.open_read(&path),
            AccessIntent::Write => self.open_write(&path),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, path), fields(path = %path), name = "layerfs.read")]
    fn open_read(&self, path: &VPath) -> FsResult<FileHandle> {
        let bindings = self.search_path();
        for binding in &bindings {
            let store = self.store(binding.location());
            let kind = self.kind_of(binding, store);

            if kind.is_archive() {
                if !store.exists(binding.base()) {
                    tracing::trace!(archive = %binding.base(), "archive missing, skipping");
                    continue;
                }
                let mut mount = store.open_archive(binding.base()).inspect_err(|e| {
                    tracing::warn!(archive = %binding.base(), error = %e, "archive unreadable, search stopped");
                })?;
                if let Some(bytes) = mount.read_member(path)? {
                    tracing::debug!(archive = %binding.base(), size = bytes.len(), "resolved from archive");
                    return Ok(FileHandle::snapshot(format!("{}:{path}", mount.origin()), bytes));
                }
                tracing::trace!(archive = %binding.base(), "no such member");
                continue;
            }

            let concrete = binding.base().append(path);
            if store.exists(&concrete) {
                tracing::debug!(base = %binding.base(), location = %binding.location(), "resolved");
                return store.open_handle(&concrete);
            }
            tracing::trace!(base = %binding.base(), "miss");
        }
        tracing::debug!(searched = bindings.len(), "not found on search path");
        Err(FsError::not_found(path))
    }

    fn open_write(&self, path: &VPath) -> FsResult<FileHandle> {
        let target = self.sandboxed(path)?;
        Ok(FileHandle::disk(self.external.concrete(&target)?, true))
    }

    /// Effective kind of a binding, confirming it against its store first
    /// if that has not happened yet.
    fn kind_of(&self, binding: &SearchBinding, store: &dyn Store) -> EntryKind {
        let state = binding.kind();
        if let Some(actual) = state.actual() {
            return actual;
        }
        match self.oracle.actual_kind(store, binding.base()) {
            Some(actual) => {
                self.registry
                    .write()
                    .refine(binding.base(), binding.location(), actual);
                actual
            }
            None => state.effective(),
        }
    }

    // ========================================================================
    // Path checks
    // ========================================================================

    /// Normalize and apply the traversal policy.
    pub(crate) fn checked(&self, path: impl IntoVPath) -> FsResult<VPath> {
        let path = path.into_vpath().normalize();
        if self.traversal.permits(&path) {
            Ok(path)
        } else {
            tracing::warn!(path = %path, "rejected unsafe path");
            Err(FsError::unsafe_path(path))
        }
    }

    /// Join an already checked path onto the write root.
    pub(crate) fn sandboxed(&self, path: &VPath) -> FsResult<VPath> {
        let root = self.write_root().ok_or(FsError::WriteRootUnset)?;
        Ok(root.append(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleKind;
    use crate::registry::KindStage;
    use tempfile::TempDir;

    fn setup() -> (LayerFs, TempDir) {
        let dir = TempDir::new().unwrap();
        let fs = LayerFs::new(FsConfig::new().with_external_root(dir.path())).unwrap();
        (fs, dir)
    }

    fn write(dir: &TempDir, rel: &str, data: &str) {
        let full = dir.path().join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, data).unwrap();
    }

    #[test]
    fn test_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LayerFs>();
    }

    #[test]
    fn test_first_binding_wins() {
        let (fs, dir) = setup();
        write(&dir, "a/x.txt", "from a");
        write(&dir, "b/x.txt", "from b");
        write(&dir, "b/only_b.txt", "b");
        fs.register_search_path("a", Location::External).unwrap();
        fs.register_search_path("b", Location::External).unwrap();

        let handle = fs.open("x.txt", AccessIntent::Read).unwrap();
        assert_eq!(handle.read_string().unwrap(), "from a");
        assert!(!handle.is_writable());
        assert_eq!(fs.open("only_b.txt", AccessIntent::Read).unwrap().read_string().unwrap(), "b");
    }

    #[test]
    fn test_read_miss() {
        let (fs, dir) = setup();
        write(&dir, "a/x.txt", "x");
        fs.register_search_path("a", Location::External).unwrap();
        assert!(fs.open("y.txt", AccessIntent::Read).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unsafe_open_rejected() {
        let (fs, _dir) = setup();
        let err = fs.open("../etc/passwd", AccessIntent::Read).unwrap_err();
        assert!(matches!(err, FsError::UnsafePath(_)));
        let err = fs.open("a/../../b", AccessIntent::Write).unwrap_err();
        assert!(matches!(err, FsError::UnsafePath(_)));
    }

    #[test]
    fn test_write_needs_root() {
        let (fs, _dir) = setup();
        assert!(matches!(fs.open("a.txt", AccessIntent::Write), Err(FsError::WriteRootUnset)));
    }

    #[test]
    fn test_write_binds_into_root() {
        let (fs, dir) = setup();
        std::fs::create_dir(dir.path().join("saves")).unwrap();
        fs.set_write_root("saves").unwrap();

        let handle = fs.open("slot.sav", AccessIntent::Write).unwrap();
        assert_eq!(handle.kind(), HandleKind::Disk);
        assert!(handle.is_writable());
        handle.write_string("progress", false).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("saves/slot.sav")).unwrap(),
            "progress"
        );
    }

    #[test]
    fn test_kind_refined_on_read() {
        let (fs, dir) = setup();
        write(&dir, "thing.zip/inside.txt", "plain dir");
        fs.register_search_path("thing.zip", Location::External).unwrap();

        let before = fs.search_path()[0].kind();
        assert_eq!(before.effective(), EntryKind::Archive);
        assert_eq!(before.stage(), KindStage::Predicted);

        let handle = fs.open("inside.txt", AccessIntent::Read).unwrap();
        assert_eq!(handle.read_string().unwrap(), "plain dir");

        let after = fs.search_path()[0].kind();
        assert_eq!(after.effective(), EntryKind::Directory);
        assert_eq!(after.stage(), KindStage::Actual);
    }

    #[test]
    fn test_missing_archive_skipped() {
        let (fs, dir) = setup();
        write(&dir, "fallback/x.txt", "fallback");
        fs.register_search_path("gone.zip", Location::External).unwrap();
        fs.register_search_path("fallback", Location::External).unwrap();

        let handle = fs.open("x.txt", AccessIntent::Read).unwrap();
        assert_eq!(handle.read_string().unwrap(), "fallback");
        assert_eq!(fs.search_path()[0].kind().stage(), KindStage::Predicted);
    }

    #[test]
    fn test_corrupt_archive_stops_search() {
        let (fs, dir) = setup();
        write(&dir, "broken.zip", "definitely not a zip");
        write(&dir, "fallback/x.txt", "fallback");
        fs.register_search_path("broken.zip", Location::External).unwrap();
        fs.register_search_path("fallback", Location::External).unwrap();

        let err = fs.open("x.txt", AccessIntent::Read).unwrap_err();
        assert!(matches!(err, FsError::Archive(_)));
    }

    #[test]
    fn test_invalid_config() {
        let err = LayerFs::new(FsConfig::new().with_archive_extensions([""])).unwrap_err();
        assert!(matches!(err, FsError::Config(_)));
    }
}
