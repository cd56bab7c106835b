//! Map node: either a leaf value or a nested map

use super::NestedMap;
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use std::fmt;

/// Which variant a [`Node`] holds
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An opaque leaf value
    Leaf,
    /// A nested map
    Map,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf => f.write_str("leaf"),
            Self::Map => f.write_str("map"),
        }
    }
}

/// A value stored in a [`NestedMap`]
///
/// `Map` holds a handle, so a node read out of a map aliases the subtree
/// it came from.
#[derive(Clone)]
pub enum Node<T = Tensor> {
    /// An opaque leaf value
    Leaf(T),
    /// A nested map sharing storage with wherever it was assigned from
    Map(NestedMap<T>),
}

impl<T> Node<T> {
    /// Which variant this node holds
    #[inline]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Leaf,
            Self::Map(_) => NodeKind::Map,
        }
    }

    /// True if this node is a leaf
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// True if this node is a nested map
    #[inline]
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Borrow the leaf value, if any
    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            Self::Leaf(value) => Some(value),
            Self::Map(_) => None,
        }
    }

    /// Borrow the nested map, if any
    pub fn as_map(&self) -> Option<&NestedMap<T>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Leaf(_) => None,
        }
    }

    /// Take the leaf value, failing with `TypeMismatch` on a map
    pub fn into_leaf(self) -> Result<T> {
        match self {
            Self::Leaf(value) => Ok(value),
            Self::Map(_) => Err(Error::type_mismatch(NodeKind::Leaf, NodeKind::Map)),
        }
    }

    /// Take the nested map, failing with `TypeMismatch` on a leaf
    pub fn into_map(self) -> Result<NestedMap<T>> {
        match self {
            Self::Map(map) => Ok(map),
            Self::Leaf(_) => Err(Error::type_mismatch(NodeKind::Map, NodeKind::Leaf)),
        }
    }
}

impl<T> From<NestedMap<T>> for Node<T> {
    fn from(map: NestedMap<T>) -> Self {
        Self::Map(map)
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_accessors() {
        let node: Node<i32> = Node::Leaf(7);
        assert_eq!(node.kind(), NodeKind::Leaf);
        assert!(node.is_leaf());
        assert_eq!(node.as_leaf(), Some(&7));
        assert!(node.as_map().is_none());
        assert_eq!(node.clone().into_leaf().unwrap(), 7);
        assert_eq!(
            node.into_map().unwrap_err(),
            Error::type_mismatch(NodeKind::Map, NodeKind::Leaf)
        );
    }

    #[test]
    fn test_map_accessors() {
        let map = NestedMap::<i32>::new();
        let node = Node::from(map.clone());
        assert_eq!(node.kind(), NodeKind::Map);
        assert!(node.as_map().unwrap().is_same(&map));
        assert_eq!(
            node.clone().into_leaf().unwrap_err(),
            Error::type_mismatch(NodeKind::Leaf, NodeKind::Map)
        );
        assert!(node.into_map().unwrap().is_same(&map));
    }
}
