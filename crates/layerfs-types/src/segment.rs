//! Path segments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Text of the "current directory" segment.
pub const CURRENT: &str = ".";
/// Text of the "parent directory" segment.
pub const PARENT: &str = "..";

/// One component of a path, e.g. `music`, `..` or `archive.zip`.
///
/// The path `music/dungeon/dungeon_dark.mp3` is made of three segments.
/// A segment is opaque text: it is never validated or rewritten, and two
/// segments are equal exactly when their text is.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segment(String);

impl Segment {
    /// Create a segment from its text.
    ///
    /// The text is taken as-is. Use [`VPath::parse`](crate::VPath::parse)
    /// when the input may contain separators.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The segment text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the text starts with `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Returns true if the text ends with `suffix`.
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }

    /// Returns true if the text contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }

    /// Returns true for `.`.
    pub fn is_current(&self) -> bool {
        self.0 == CURRENT
    }

    /// Returns true for `..`.
    pub fn is_parent(&self) -> bool {
        self.0 == PARENT
    }

    /// Returns true if the text names exactly one ordinary entry.
    ///
    /// Empty text, `.`, `..`, and anything holding a separator (`/`, `\`)
    /// or NUL is not plain: joined onto a root it could point somewhere
    /// other than one level below it.
    pub fn is_plain(&self) -> bool {
        !self.0.is_empty()
            && !self.is_current()
            && !self.is_parent()
            && !self.0.contains(['/', '\\', '\0'])
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl PartialEq<str> for Segment {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Segment {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment({:?})", self.0)
    }
}
