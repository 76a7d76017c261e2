//! Immutable virtual paths.
//!
//! A [`VPath`] is an ordered list of [`Segment`]s. It is never tied to a
//! concrete filesystem: backing stores decide how a `VPath` maps onto disk
//! or onto bundled resources. All operations return new values.
//!
//! ## Parsing
//!
//! Text is split on `/` (or a custom divider). Empty pieces are dropped, so
//! `"a//b/"`, `"/a/b"` and `"a/b"` are the same path, and `""` is the empty
//! path. `.` and `..` are kept verbatim until [`VPath::normalize`] runs.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::error::PathError;
use crate::segment::Segment;

/// Separator used by [`VPath::parse`] and the textual form.
pub const SEPARATOR: &str = "/";

/// An immutable, ordered sequence of path segments.
#[derive(Clone, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VPath {
    segments: Vec<Segment>,
}

impl VPath {
    /// The empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path from segments, in order.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    /// Parse `/`-delimited text.
    pub fn parse(text: &str) -> Self {
        Self::split(text, SEPARATOR)
    }

    /// Parse text delimited by `divider`.
    pub fn parse_with(text: &str, divider: &str) -> Result<Self, PathError> {
        if divider.is_empty() {
            return Err(PathError::EmptyDivider);
        }
        Ok(Self::split(text, divider))
    }

    fn split(text: &str, divider: &str) -> Self {
        Self::from_segments(
            text.split(divider)
                .filter(|piece| !piece.is_empty())
                .map(Segment::from),
        )
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the empty path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterate over the segments.
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// The last segment, if any.
    pub fn file_name(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Everything but the last segment. `None` for the empty path.
    pub fn parent(&self) -> Option<VPath> {
        let (_, init) = self.segments.split_last()?;
        Some(Self::from_segments(init.iter().cloned()))
    }

    /// New path with `segment` added at the end.
    pub fn append_segment(&self, segment: impl Into<Segment>) -> VPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// New path with `other` added at the end.
    pub fn append(&self, other: &VPath) -> VPath {
        let mut segments = Vec::with_capacity(self.len() + other.len());
        segments.extend_from_slice(&self.segments);
        segments.extend_from_slice(&other.segments);
        Self { segments }
    }

    /// New path with `segment` added at the front.
    pub fn prepend_segment(&self, segment: impl Into<Segment>) -> VPath {
        let mut segments = Vec::with_capacity(self.len() + 1);
        segments.push(segment.into());
        segments.extend_from_slice(&self.segments);
        Self { segments }
    }

    /// New path with `other` added at the front.
    pub fn prepend(&self, other: &VPath) -> VPath {
        other.append(self)
    }

    /// Sub-path over the segment range `[start, end)`.
    ///
    /// `start == end` yields the empty path.
    pub fn slice(&self, start: usize, end: usize) -> Result<VPath, PathError> {
        if start > end {
            return Err(PathError::StartAfterEnd { start, end });
        }
        if end > self.len() {
            return Err(PathError::EndOutOfRange {
                end,
                len: self.len(),
            });
        }
        Ok(Self::from_segments(self.segments[start..end].iter().cloned()))
    }

    /// Returns true if any segment equals `segment` exactly.
    pub fn contains_segment(&self, segment: &str) -> bool {
        self.segments.iter().any(|s| s == segment)
    }

    /// Returns true if the joined textual form contains `text`.
    pub fn contains_text(&self, text: &str) -> bool {
        self.to_string().contains(text)
    }

    /// Textual form joined with `divider` instead of `/`.
    ///
    /// The inverse of [`parse_with`](Self::parse_with) for paths whose
    /// segments do not contain `divider`.
    pub fn to_string_with(&self, divider: &str) -> Result<String, PathError> {
        if divider.is_empty() {
            return Err(PathError::EmptyDivider);
        }
        Ok(self
            .segments
            .iter()
            .map(Segment::as_str)
            .collect::<Vec<_>>()
            .join(divider))
    }

    /// Textual form of the first `count` segments.
    ///
    /// Counts larger than the path are clamped.
    pub fn to_string_limited(&self, count: usize) -> String {
        self.segments
            .iter()
            .take(count)
            .map(Segment::as_str)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// Remove `.` segments and collapse `X/..` pairs.
    ///
    /// Runs to a fixed point in one left-to-right pass: a `..` cancels the
    /// nearest surviving segment before it unless that segment is itself a
    /// `..`. A leading `..` has nothing to cancel and is kept, since its
    /// target lies outside anything this path knows about.
    pub fn normalize(&self) -> VPath {
        let mut out: Vec<Segment> = Vec::with_capacity(self.len());
        for segment in &self.segments {
            if segment.is_current() {
                continue;
            }
            if segment.is_parent() && out.last().is_some_and(|last| !last.is_parent()) {
                out.pop();
                continue;
            }
            out.push(segment.clone());
        }
        Self { segments: out }
    }

    /// Returns true if [`normalize`](Self::normalize) would not change this path.
    pub fn is_normalized(&self) -> bool {
        self.normalize() == *self
    }

    /// Returns true if every segment of the normalized path is plain.
    ///
    /// A surviving `..` can only mean an attempt to climb out of whatever
    /// root this path is joined onto. A segment carrying a separator (built
    /// with a custom divider or directly from a [`Segment`]) could do the
    /// same once joined onto disk, so it is unsafe too.
    pub fn is_safe(&self) -> bool {
        self.normalize().iter().all(Segment::is_plain)
    }
}

impl fmt::Display for VPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_limited(self.len()))
    }
}

impl fmt::Debug for VPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VPath({:?})", self.to_string())
    }
}

impl FromStr for VPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for VPath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for VPath {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<VPath> for String {
    fn from(path: VPath) -> Self {
        path.to_string()
    }
}

impl From<Segment> for VPath {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl PartialEq<str> for VPath {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for VPath {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl<'a> IntoIterator for &'a VPath {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Anything the public API accepts as a path: a built [`VPath`] or text.
pub trait IntoVPath {
    fn into_vpath(self) -> VPath;
}

impl IntoVPath for VPath {
    fn into_vpath(self) -> VPath {
        self
    }
}

impl IntoVPath for &VPath {
    fn into_vpath(self) -> VPath {
        self.clone()
    }
}

impl IntoVPath for &str {
    fn into_vpath(self) -> VPath {
        VPath::parse(self)
    }
}

impl IntoVPath for String {
    fn into_vpath(self) -> VPath {
        VPath::parse(&self)
    }
}

impl IntoVPath for &String {
    fn into_vpath(self) -> VPath {
        VPath::parse(self)
    }
}

impl IntoVPath for Segment {
    fn into_vpath(self) -> VPath {
        VPath::from(self)
    }
}

/// What to do with a `..` that survives normalization.
///
/// Normalization can only leave `..` at the very front of a path. Whether
/// such a path is an escape attempt or a legitimate reference to the
/// parent of a root is a product decision, so it is configurable.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum TraversalPolicy {
    /// Any surviving `..` makes the path unsafe.
    #[default]
    Reject,
    /// A leading run of `..` is tolerated.
    AllowLeading,
}

impl TraversalPolicy {
    /// Returns true if `path` may be used under this policy.
    pub fn permits(&self, path: &VPath) -> bool {
        match self {
            TraversalPolicy::Reject => path.is_safe(),
            TraversalPolicy::AllowLeading => path
                .normalize()
                .iter()
                .skip_while(|s| s.is_parent())
                .all(Segment::is_plain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moon() -> VPath {
        VPath::parse("welcome/to/the/moon/friend")
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(moon().to_string(), "welcome/to/the/moon/friend");
        assert_eq!(moon().len(), 5);
        assert!(VPath::parse("").is_empty());
        assert_eq!(VPath::parse("/a//b/"), VPath::parse("a/b"));
    }

    #[test]
    fn test_parse_with_divider() {
        let hashed = VPath::parse_with("welcome#to#the#moon#friend", "#").unwrap();
        assert_eq!(hashed, moon());
        assert_eq!(VPath::parse_with("a/b", ""), Err(PathError::EmptyDivider));
    }

    #[test]
    fn test_to_string_with_divider() {
        assert_eq!(moon().to_string_with("#").unwrap(), "welcome#to#the#moon#friend");
        let hashed = VPath::parse_with("a#b#c", "#").unwrap();
        assert_eq!(
            VPath::parse_with(&hashed.to_string_with("#").unwrap(), "#").unwrap(),
            hashed
        );
        assert_eq!(VPath::new().to_string_with("::").unwrap(), "");
        assert_eq!(moon().to_string_with(""), Err(PathError::EmptyDivider));
    }

    #[test]
    fn test_contains_segment() {
        let path = moon();
        for segment in ["welcome", "to", "the", "moon", "friend"] {
            assert!(path.contains_segment(segment));
        }
        for segment in ["welc", "tot", "thetha", "m0n", "friend_"] {
            assert!(!path.contains_segment(segment));
        }
    }

    #[test]
    fn test_contains_text() {
        let path = moon();
        for text in ["welcome", "welcome/to/t", "/to/the/mo", "welcome/to/the/moon/friend"] {
            assert!(path.contains_text(text), "{text}");
        }
        for text in ["dne", "42", "\\to\\the\\moon", "/welcome / to the moon"] {
            assert!(!path.contains_text(text), "{text}");
        }
    }

    #[test]
    fn test_prepend() {
        let pre = moon().prepend_segment("prepended");
        assert_eq!(pre.slice(0, 1).unwrap().to_string(), "prepended");
        assert_eq!(pre.to_string(), "prepended/welcome/to/the/moon/friend");

        let prefix = VPath::parse("prepend/entire/path");
        let pre = moon().prepend(&prefix);
        assert_eq!(pre.slice(0, prefix.len()).unwrap(), prefix);
        assert_eq!(pre.to_string(), format!("{prefix}/{}", moon()));
    }

    #[test]
    fn test_append() {
        let app = moon().append_segment("appended");
        assert!(app.contains_segment("appended"));
        assert_eq!(app.slice(app.len() - 1, app.len()).unwrap(), "appended");

        let suffix = VPath::parse("append/entire/path");
        let app = moon().append(&suffix);
        assert_eq!(app.slice(app.len() - suffix.len(), app.len()).unwrap(), suffix);
        assert_eq!(app.to_string(), format!("{}/{suffix}", moon()));
    }

    #[test]
    fn test_append_does_not_mutate() {
        let base = moon();
        let _ = base.append_segment("x");
        assert_eq!(base, moon());
    }

    #[test]
    fn test_slice() {
        let path = moon();
        assert_eq!(path.slice(0, 3).unwrap(), VPath::parse("welcome/to/the"));
        assert_eq!(path.slice(0, 0).unwrap(), VPath::new());
        assert_eq!(path.slice(5, 5).unwrap(), VPath::new());
        assert_eq!(path.slice(0, path.len()).unwrap(), path);
        assert_eq!(
            path.slice(3, 1),
            Err(PathError::StartAfterEnd { start: 3, end: 1 })
        );
        assert_eq!(
            path.slice(0, 6),
            Err(PathError::EndOutOfRange { end: 6, len: 5 })
        );
    }

    #[test]
    fn test_to_string_limited() {
        let path = moon();
        assert_eq!(path.to_string_limited(path.len()), "welcome/to/the/moon/friend");
        assert_eq!(path.to_string_limited(usize::MAX), "welcome/to/the/moon/friend");
        assert_eq!(path.to_string_limited(2), "welcome/to");
        assert_eq!(path.to_string_limited(0), "");
    }

    #[test]
    fn test_iter() {
        let path = moon();
        let names: Vec<&str> = path.iter().map(Segment::as_str).collect();
        assert_eq!(names, ["welcome", "to", "the", "moon", "friend"]);
    }

    #[test]
    fn test_parent_and_file_name() {
        let path = VPath::parse("mods/coolmod.zip");
        assert_eq!(path.file_name().map(Segment::as_str), Some("coolmod.zip"));
        assert_eq!(path.parent(), Some(VPath::parse("mods")));
        assert_eq!(VPath::new().parent(), None);
    }

    #[test]
    fn test_normalize() {
        let mini = VPath::parse("not/././minimized/../path").normalize();
        assert_eq!(mini, VPath::parse("not/path"));
        assert!(mini.is_normalized());

        let plain = VPath::parse("should/not/mini");
        assert_eq!(plain.normalize(), plain);

        let leading = VPath::parse("../should/not/mini");
        assert_eq!(leading.normalize(), leading);
        assert!(leading.is_normalized());
    }

    #[test]
    fn test_normalize_stacked_parents() {
        assert_eq!(VPath::parse("a/../../b").normalize(), VPath::parse("../b"));
        assert_eq!(VPath::parse("a/b/../..").normalize(), VPath::new());
        assert_eq!(VPath::parse("../../x/..").normalize(), VPath::parse("../.."));
        assert_eq!(VPath::parse("./.").normalize(), VPath::new());
    }

    #[test]
    fn test_normalize_idempotent() {
        for text in [
            "",
            "a/b/c",
            "./a/./b",
            "a/../b/../c",
            "../a/../../b",
            "x/y/../../../z",
            "this/./is/../././not/minimized",
        ] {
            let once = VPath::parse(text).normalize();
            assert_eq!(once.normalize(), once, "{text}");
        }
    }

    #[test]
    fn test_is_normalized() {
        assert!(moon().is_normalized());
        assert!(VPath::parse("../minimized/this/is").is_normalized());
        assert!(!VPath::parse("./not/minimized").is_normalized());
        assert!(!VPath::parse("this/./is/../././not/minimized").is_normalized());
    }

    #[test]
    fn test_is_safe() {
        assert!(moon().is_safe());
        assert!(VPath::parse("dir/../home").is_safe());
        assert!(!VPath::parse("../x").is_safe());
        assert!(!VPath::parse("a/../../etc/passwd").is_safe());
    }

    #[test]
    fn test_separator_inside_segment_is_unsafe() {
        let hashed = VPath::parse_with("sub/../../../escaped.txt", "#").unwrap();
        assert_eq!(hashed.len(), 1);
        assert!(!hashed.is_safe());

        let absolute = VPath::from_segments([Segment::new("/tmp/abs.txt")]);
        assert!(!absolute.is_safe());
        assert!(!TraversalPolicy::AllowLeading.permits(&absolute));

        let leading = VPath::from_segments([Segment::new(".."), Segment::new("a/b")]);
        assert!(!TraversalPolicy::AllowLeading.permits(&leading));
    }

    #[test]
    fn test_traversal_policy() {
        let leading = VPath::parse("../shared/assets");
        assert!(!TraversalPolicy::Reject.permits(&leading));
        assert!(TraversalPolicy::AllowLeading.permits(&leading));
        assert!(TraversalPolicy::Reject.permits(&moon()));
        assert_eq!(
            "allow_leading".parse::<TraversalPolicy>().ok(),
            Some(TraversalPolicy::AllowLeading)
        );
    }

    #[test]
    fn test_into_vpath() {
        assert_eq!("a/b".into_vpath(), VPath::parse("a/b"));
        assert_eq!(String::from("a/b").into_vpath(), VPath::parse("a/b"));
        assert_eq!((&moon()).into_vpath(), moon());
        assert_eq!(Segment::new("x").into_vpath(), VPath::parse("x"));
    }
}
