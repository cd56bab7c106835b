//! Key validation and the `Path` type

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Deref;

/// Stack allocation threshold for path segments
const STACK_SEGMENTS: usize = 4;

/// Ordered sequence of key segments addressing a node at any depth
///
/// Paths returned by the crate (from [`NestedMap::keys`](super::NestedMap::keys)
/// and in errors) are never empty. Paths built by callers may be, and path
/// operations reject them with [`Error::EmptyPath`].
///
/// Ordering is lexicographic by segment, so paths sort naturally in a
/// `BTreeSet`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Path(SmallVec<[String; STACK_SEGMENTS]>);

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Append a segment.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Copy of this path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Number of segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this path has no segments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// View the segments as a slice.
    pub fn as_slice(&self) -> &[String] {
        self.0.as_slice()
    }
}

impl Deref for Path {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl AsRef<[String]> for Path {
    fn as_ref(&self) -> &[String] {
        self.0.as_slice()
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Segments joined with `/`
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> From<Vec<S>> for Path {
    fn from(value: Vec<S>) -> Self {
        value.into_iter().collect()
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Path {
    fn from(value: [S; N]) -> Self {
        value.into_iter().collect()
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        std::iter::once(value).collect()
    }
}

/// Reject the empty key
#[inline]
pub(crate) fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::EmptyKey);
    }
    Ok(())
}

/// Reject empty paths and paths containing an empty segment
pub(crate) fn check_path<S: AsRef<str>>(path: &[S]) -> Result<()> {
    if path.is_empty() {
        return Err(Error::EmptyPath);
    }
    path.iter().try_for_each(|segment| check_key(segment.as_ref()))
}
