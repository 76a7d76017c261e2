//! Search path registry.
//!
//! Holds the ordered search bindings and the write root. Insertion order is
//! priority order: the first binding registered is consulted first. Bindings
//! are never removed.

use layerfs_types::{EntryKind, IntoVPath, Location, TraversalPolicy, VPath};
use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};
use crate::oracle::TypeOracle;

/// Which classification a [`KindState`] currently reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindStage {
    /// Guessed from the name at registration.
    Predicted,
    /// Confirmed against a store.
    Actual,
}

/// Two-stage kind of a binding's base path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindState {
    predicted: EntryKind,
    actual: Option<EntryKind>,
}

impl KindState {
    /// State with only a prediction.
    pub fn predicted(kind: EntryKind) -> Self {
        Self {
            predicted: kind,
            actual: None,
        }
    }

    /// The name-based guess.
    pub fn prediction(&self) -> EntryKind {
        self.predicted
    }

    /// The confirmed kind, once known.
    pub fn actual(&self) -> Option<EntryKind> {
        self.actual
    }

    /// Actual kind when known, prediction otherwise.
    pub fn effective(&self) -> EntryKind {
        self.actual.unwrap_or(self.predicted)
    }

    /// Which stage [`effective`](Self::effective) comes from.
    pub fn stage(&self) -> KindStage {
        if self.actual.is_some() {
            KindStage::Actual
        } else {
            KindStage::Predicted
        }
    }

    /// Record the confirmed kind. Overrides any earlier one.
    pub fn refine(&mut self, actual: EntryKind) {
        self.actual = Some(actual);
    }
}

/// One entry of the search path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBinding {
    base: VPath,
    location: Location,
    kind: KindState,
}

impl SearchBinding {
    /// Registered base path, normalized.
    pub fn base(&self) -> &VPath {
        &self.base
    }

    /// Location the base lives in.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Classification of the base.
    pub fn kind(&self) -> KindState {
        self.kind
    }

    fn is(&self, base: &VPath, location: Location) -> bool {
        self.location == location && self.base == *base
    }
}

/// Ordered search bindings plus the write root.
#[derive(Debug, Clone)]
pub struct Registry {
    bindings: Vec<SearchBinding>,
    write_root: Option<VPath>,
    oracle: TypeOracle,
    traversal: TraversalPolicy,
}

impl Registry {
    /// Empty registry.
    pub fn new(oracle: TypeOracle, traversal: TraversalPolicy) -> Self {
        Self {
            bindings: Vec::new(),
            write_root: None,
            oracle,
            traversal,
        }
    }

    /// Append a binding at the lowest priority.
    ///
    /// The path is normalized first. Unsafe paths and `(path, location)`
    /// pairs already present are rejected and leave the registry unchanged.
    pub fn register(&mut self, path: impl IntoVPath, location: Location) -> FsResult<()> {
        let base = path.into_vpath().normalize();
        if !self.traversal.permits(&base) {
            return Err(FsError::unsafe_path(&base));
        }
        if self.bindings.iter().any(|b| b.is(&base, location)) {
            return Err(FsError::already_registered(format!("{location}:{base}")));
        }
        let kind = KindState::predicted(self.oracle.predict_kind(&base));
        tracing::info!(path = %base, %location, predicted = %kind.prediction(), "search path added");
        self.bindings.push(SearchBinding {
            base,
            location,
            kind,
        });
        Ok(())
    }

    /// Returns true if exactly this path is registered, under any location.
    pub fn contains(&self, path: impl IntoVPath) -> bool {
        let path = path.into_vpath().normalize();
        if !self.traversal.permits(&path) {
            return false;
        }
        self.bindings.iter().any(|b| b.base == path)
    }

    /// Record the confirmed kind of a binding.
    ///
    /// Returns false if no such binding exists.
    pub fn refine(&mut self, base: &VPath, location: Location, actual: EntryKind) -> bool {
        match self.bindings.iter_mut().find(|b| b.is(base, location)) {
            Some(binding) => {
                if binding.kind.prediction() != actual && binding.kind.actual().is_none() {
                    tracing::debug!(path = %base, %location, predicted = %binding.kind.prediction(), %actual, "kind corrected");
                }
                binding.kind.refine(actual);
                true
            }
            None => false,
        }
    }

    /// Replace the write root. The stored root is the normalized path.
    pub fn set_write_root(&mut self, path: impl IntoVPath) {
        let root = path.into_vpath().normalize();
        tracing::debug!(root = %root, "write root set");
        self.write_root = Some(root);
    }

    /// Current write root.
    pub fn write_root(&self) -> Option<&VPath> {
        self.write_root.as_ref()
    }

    /// Bindings in priority order.
    pub fn bindings(&self) -> &[SearchBinding] {
        &self.bindings
    }

    /// Binding for `(path, location)`, if registered.
    pub fn get(&self, path: &VPath, location: Location) -> Option<&SearchBinding> {
        self.bindings.iter().find(|b| b.is(path, location))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Policy applied to registered paths.
    pub fn traversal(&self) -> TraversalPolicy {
        self.traversal
    }
}
