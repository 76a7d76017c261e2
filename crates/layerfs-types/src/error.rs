//! Validation errors for the path model.

use thiserror::Error;

/// Malformed input to a path operation.
///
/// These are caller bugs (bad indices, empty divider), not runtime
/// conditions, so they fail fast instead of degrading to "not found".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// `slice` was asked for a range that starts after it ends.
    #[error("start must be <= end (start {start}, end {end})")]
    StartAfterEnd { start: usize, end: usize },

    /// `slice` was asked for a range past the last segment.
    #[error("end {end} is out of range for a path of {len} segments")]
    EndOutOfRange { end: usize, len: usize },

    /// A custom divider for parsing was empty.
    #[error("divider must not be empty")]
    EmptyDivider,
}
