//! Read-priority overlay filesystem.
//!
//! A host registers an ordered list of directories, bundled resource roots
//! and zip archives. Reads resolve against that list, first hit wins, and
//! archive members come back as in-memory snapshots. Writes are confined to
//! a single external write root.
//!
//! # Architecture
//!
//! ```text
//! LayerFs ──┬── Registry (RwLock) ── SearchBinding { base, location, KindState }
//!           ├── TypeOracle           predicted / actual entry kinds
//!           ├── ExternalStore        disk under FsConfig::external_root
//!           └── BundledStore         include_dir! tree (INTERNAL)
//!                    │
//!                    └── ArchiveMount  scoped zip, one lookup at a time
//! ```
//!
//! Path handling lives in [`layerfs_types`]: every entry point normalizes
//! its path and applies the configured [`TraversalPolicy`] before touching
//! any store.

pub mod archive;
pub mod config;
pub mod error;
pub mod fs;
pub mod handle;
mod mutate;
pub mod oracle;
pub mod registry;
pub mod store;

pub use archive::ArchiveMount;
pub use config::{ConfigError, FsConfig};
pub use error::{FsError, FsResult};
pub use fs::LayerFs;
pub use handle::{FileHandle, HandleKind};
pub use oracle::TypeOracle;
pub use registry::{KindStage, KindState, Registry, SearchBinding};
pub use store::{BundledStore, ExternalStore, Store};

pub use layerfs_types::{
    AccessIntent, EntryKind, IntoVPath, Location, PathError, Segment, TraversalPolicy, VPath,
};
