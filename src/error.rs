//! Error types for tensormap

use crate::dtype::DType;
use crate::map::{NodeKind, Path};
use std::fmt;
use thiserror::Error;

/// Result type alias using tensormap's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Why a path segment could not be traversed
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathErrorReason {
    /// The segment is absent from the map at its level
    Missing,
    /// The segment names a leaf, but more segments follow it
    NotAMap,
}

impl fmt::Display for PathErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("key not found"),
            Self::NotAMap => f.write_str("expected a map but found a leaf"),
        }
    }
}

/// Errors that can occur in tensormap operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Single-key lookup on an absent key
    #[error("Key not found: {key:?}")]
    KeyNotFound {
        /// The missing key
        key: String,
    },

    /// A path segment did not resolve
    #[error("Invalid path {path}: {reason} at index {index}")]
    InvalidPath {
        /// The full path that was requested
        path: Path,
        /// Index of the segment that failed to resolve
        index: usize,
        /// What went wrong at that segment
        reason: PathErrorReason,
    },

    /// A path operation was invoked with zero segments
    #[error("Path must have at least one segment")]
    EmptyPath,

    /// A key (or path segment) was the empty string
    #[error("Keys must be non-empty strings")]
    EmptyKey,

    /// A node was read as a variant it does not hold
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The variant the caller asked for
        expected: NodeKind,
        /// The variant actually stored
        found: NodeKind,
    },

    /// A map was reached again from inside itself during enumeration
    #[error("Cyclic structure: {path} refers back to one of its ancestors")]
    CyclicStructure {
        /// Path of the map node that closes the cycle
        path: Path,
    },

    /// Shape mismatch when building a tensor
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// DType mismatch between a tensor and a requested element type
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Stored dtype
        lhs: DType,
        /// Requested dtype
        rhs: DType,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Create a key-not-found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create an invalid path error for the segment at `index`
    pub fn invalid_path<S: AsRef<str>>(path: &[S], index: usize, reason: PathErrorReason) -> Self {
        Self::InvalidPath {
            path: path.iter().map(|s| s.as_ref()).collect(),
            index,
            reason,
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: NodeKind, found: NodeKind) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_message() {
        let err = Error::invalid_path(&["a", "b", "c"], 1, PathErrorReason::NotAMap);
        assert_eq!(
            err.to_string(),
            "Invalid path a/b/c: expected a map but found a leaf at index 1"
        );
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = Error::type_mismatch(NodeKind::Map, NodeKind::Leaf);
        assert_eq!(err.to_string(), "Type mismatch: expected map, found leaf");
    }
}
