//! Path model and shared enums for layerfs.
//!
//! This crate is the leaf of the workspace: it has no I/O and no internal
//! layerfs dependencies. Everything here is a plain value type.
//!
//! # Key Types
//!
//! |---------------------|--------------------------------------------------|
//! | Type                | Purpose                                          |
//! |---------------------|--------------------------------------------------|
//! | [`Segment`]         | One `/`-delimited path component                 |
//! | [`VPath`]           | Immutable ordered sequence of segments           |
//! | [`TraversalPolicy`] | What to do with `..` that survives normalization |
//! | [`Location`]        | Bundled (internal) vs. real disk (external)      |
//! | [`AccessIntent`]    | Read through the search path, or write sandbox   |
//! | [`EntryKind`]       | File, directory, or archive                      |
//! |---------------------|--------------------------------------------------|
//!
//! # Normalization
//!
//! ```
//! use layerfs_types::VPath;
//!
//! let path = VPath::parse("not/././minimized/../path");
//! assert_eq!(path.normalize().to_string(), "not/path");
//!
//! // A leading `..` has nothing to collapse against and is kept,
//! // which makes the path unsafe.
//! let escape = VPath::parse("../should/not/mini");
//! assert_eq!(escape.normalize(), escape);
//! assert!(!escape.is_safe());
//! ```

pub mod error;
pub mod kind;
pub mod path;
pub mod segment;

pub use error::PathError;
pub use kind::{AccessIntent, EntryKind, Location};
pub use path::{IntoVPath, TraversalPolicy, VPath};
pub use segment::Segment;
