//! Core NestedMap type

use super::path::{check_key, check_path};
use super::traverse::{descend, descend_or_create, leaf_paths};
use super::{Node, NodeKind, Path};
use crate::error::{Error, PathErrorReason, Result};
use crate::tensor::Tensor;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Storage shared by every handle to the same map
pub type SharedStorage<T> = Arc<RwLock<HashMap<String, Node<T>>>>;

/// Hierarchical string-keyed container of leaf values and nested maps
///
/// `NestedMap` is a handle: `clone()` returns a new reference to the same
/// storage, and every mutation is visible through all aliases. Equality
/// (`==`, [`is_same`](Self::is_same)) is storage identity, never a
/// comparison of contents.
///
/// Every method takes `&self`; each map's entries sit behind their own lock,
/// so single-key operations are atomic. Path operations lock one level at a
/// time and are not transactional with respect to concurrent writers.
///
/// # Cycles
///
/// Assigning a map beneath itself is allowed and creates a storage cycle.
/// [`keys`](Self::keys) detects it and fails with
/// [`Error::CyclicStructure`]; path operations follow only as many segments
/// as they are given and are unaffected. Storage in a cycle is never freed.
///
/// # Deep trees
///
/// Enumeration, path walks and drop all run in loops rather than recursion,
/// so depth is limited only by memory. `Debug` output stops after a fixed
/// number of levels and prints `...` for anything deeper.
///
/// # Example
///
/// ```
/// use tensormap::prelude::*;
///
/// let root = NestedMap::new();
/// let layer = NestedMap::new();
/// root.set_submap("layer", &layer)?;
/// root.set_leaf_path(["layer", "weight"], Tensor::ones::<f32>(&[4, 4]))?;
///
/// let weight = layer.get_leaf("weight")?;
/// assert_eq!(weight.shape(), &[4, 4]);
/// assert_eq!(root.keys()?.len(), 1);
/// # Ok::<(), tensormap::error::Error>(())
/// ```
pub struct NestedMap<T = Tensor> {
    storage: SharedStorage<T>,
}

impl<T> NestedMap<T> {
    /// Create an empty map with freshly allocated storage
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Storage identity: true iff both handles share storage
    #[inline]
    pub fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Number of handles (including nodes in other maps) sharing this storage
    #[inline]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.storage)
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    /// True if the map has no direct children
    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }

    /// True if `key` names a direct child
    pub fn contains_key(&self, key: &str) -> bool {
        self.storage.read().contains_key(key)
    }

    /// Names of the direct children, leaves and maps alike
    pub fn child_keys(&self) -> BTreeSet<String> {
        self.storage.read().keys().cloned().collect()
    }

    /// Names of the direct children that are leaves
    pub fn leaf_keys(&self) -> BTreeSet<String> {
        self.storage
            .read()
            .iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// True if `path` resolves to a node, leaf or map
    ///
    /// Never fails: an empty or unresolvable path is simply absent.
    pub fn contains_path<P, S>(&self, path: P) -> bool
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        let path = path.as_ref();
        let Some((last, prefix)) = path.split_last() else {
            return false;
        };
        descend(self, path, prefix.len()).is_ok_and(|parent| parent.contains_key(last.as_ref()))
    }

    /// Which variant is stored at `key`, without cloning it
    pub fn kind_of(&self, key: &str) -> Result<NodeKind> {
        self.storage
            .read()
            .get(key)
            .map(Node::kind)
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Insert or overwrite `key` with a leaf
    pub fn set_leaf(&self, key: &str, value: T) -> Result<()> {
        self.insert(key, Node::Leaf(value))
    }

    /// Insert or overwrite `key` with a map aliasing `value`'s storage
    ///
    /// The subtree is not copied: this map and `value` become co-owners of
    /// the same storage.
    pub fn set_submap(&self, key: &str, value: &NestedMap<T>) -> Result<()> {
        self.insert(key, Node::Map(value.clone()))
    }

    /// Insert or overwrite `key` with an arbitrary node
    pub fn set(&self, key: &str, node: Node<T>) -> Result<()> {
        self.insert(key, node)
    }

    /// Set the leaf at `path`; every segment but the last must already be a map
    ///
    /// Fails with `EmptyPath`, `EmptyKey`, or `InvalidPath` before anything
    /// is written.
    pub fn set_leaf_path<P, S>(&self, path: P, value: T) -> Result<()>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.set_path(path.as_ref(), Node::Leaf(value))
    }

    /// Set a map at `path`, aliasing `value`'s storage
    ///
    /// Same prefix rules as [`set_leaf_path`](Self::set_leaf_path).
    pub fn set_submap_path<P, S>(&self, path: P, value: &NestedMap<T>) -> Result<()>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.set_path(path.as_ref(), Node::Map(value.clone()))
    }

    /// Map at `path`, creating empty maps for any absent segment
    ///
    /// Unlike the `set_*_path` operations this creates intermediates. It never
    /// replaces a leaf: a leaf anywhere along `path` fails with `InvalidPath`
    /// and nothing is created.
    pub fn ensure_map_path<P, S>(&self, path: P) -> Result<NestedMap<T>>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        let path = path.as_ref();
        check_path(path)?;
        descend_or_create(self, path)
    }

    /// Every path from this map to a leaf
    ///
    /// Maps are walked into but never reported themselves, so an empty
    /// submap contributes nothing. Fails with `CyclicStructure` if a map is
    /// reachable from inside itself.
    pub fn keys(&self) -> Result<BTreeSet<Path>> {
        leaf_paths(self)
    }

    fn set_path<S: AsRef<str>>(&self, path: &[S], node: Node<T>) -> Result<()> {
        check_path(path)?;
        let last = path.len() - 1;
        let parent = descend(self, path, last)?;
        parent.insert(path[last].as_ref(), node)
    }

    fn insert(&self, key: &str, node: Node<T>) -> Result<()> {
        check_key(key)?;
        let kind = node.kind();
        let previous = self.storage.write().insert(key.to_owned(), node);
        tracing::trace!(
            key,
            %kind,
            replaced = ?previous.as_ref().map(Node::kind),
            "set node"
        );
        Ok(())
    }

    #[inline]
    pub(crate) fn storage(&self) -> &SharedStorage<T> {
        &self.storage
    }

    #[inline]
    pub(crate) fn storage_id(&self) -> usize {
        Arc::as_ptr(&self.storage) as usize
    }
}

impl<T: Clone> NestedMap<T> {
    /// Node stored at `key`
    ///
    /// A returned map aliases the stored subtree. Fails with `KeyNotFound`
    /// if `key` is absent.
    pub fn get(&self, key: &str) -> Result<Node<T>> {
        self.storage
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Leaf stored at `key`, failing with `TypeMismatch` on a map
    pub fn get_leaf(&self, key: &str) -> Result<T> {
        self.get(key)?.into_leaf()
    }

    /// Map stored at `key`, failing with `TypeMismatch` on a leaf
    pub fn get_map(&self, key: &str) -> Result<NestedMap<T>> {
        self.get(key)?.into_map()
    }

    /// Node at `path`, walking one segment per level
    ///
    /// Fails with `EmptyPath` on zero segments and `InvalidPath` when a
    /// segment is absent or a non-final segment is a leaf.
    pub fn get_path<P, S>(&self, path: P) -> Result<Node<T>>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        let path = path.as_ref();
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        let last = path.len() - 1;
        let parent = descend(self, path, last)?;
        let node = parent.storage.read().get(path[last].as_ref()).cloned();
        node.ok_or_else(|| Error::invalid_path(path, last, PathErrorReason::Missing))
    }

    /// Leaf at `path`, failing with `TypeMismatch` on a map
    pub fn get_leaf_path<P, S>(&self, path: P) -> Result<T>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.get_path(path)?.into_leaf()
    }

    /// Map at `path`, failing with `TypeMismatch` on a leaf
    pub fn get_map_path<P, S>(&self, path: P) -> Result<NestedMap<T>>
    where
        P: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.get_path(path)?.into_map()
    }
}

impl<T> Clone for NestedMap<T> {
    /// Clone aliases the storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<T> Default for NestedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PartialEq for NestedMap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl<T> Eq for NestedMap<T> {}

impl<T> Drop for NestedMap<T> {
    /// The last handle tears its subtree down with a work list, so dropping a
    /// deep tree does not recurse once per level.
    fn drop(&mut self) {
        let Some(entries) = Arc::get_mut(&mut self.storage) else {
            return;
        };
        let mut pending = take_submaps(entries.get_mut());
        while let Some(mut map) = pending.pop() {
            if let Some(entries) = Arc::get_mut(&mut map.storage) {
                pending.extend(take_submaps(entries.get_mut()));
            }
            // `map` now owns no submaps, or is still shared; either way
            // dropping it here is shallow.
        }
    }
}

/// Empty `entries`, keeping only the submap handles
fn take_submaps<T>(entries: &mut HashMap<String, Node<T>>) -> Vec<NestedMap<T>> {
    entries
        .drain()
        .filter_map(|(_, node)| match node {
            Node::Map(map) => Some(map),
            Node::Leaf(_) => None,
        })
        .collect()
}

impl<T: fmt::Debug> fmt::Debug for NestedMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DebugTree {
            map: self,
            ancestors: Vec::new(),
        }
        .fmt(f)
    }
}

/// Nesting levels printed by `Debug` before eliding the rest as `...`
const DEBUG_DEPTH_LIMIT: usize = 32;

/// Debug view that prints `<cycle>` instead of re-entering an ancestor
struct DebugTree<'a, T> {
    map: &'a NestedMap<T>,
    ancestors: Vec<usize>,
}

impl<T: fmt::Debug> fmt::Debug for DebugTree<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.map.storage.read();
        let mut entries: Vec<_> = guard.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.map.storage_id());

        let mut out = f.debug_map();
        for (key, node) in entries {
            match node {
                Node::Leaf(value) => {
                    out.entry(key, value);
                }
                Node::Map(child) if ancestors.contains(&child.storage_id()) => {
                    out.entry(key, &format_args!("<cycle>"));
                }
                Node::Map(_) if ancestors.len() >= DEBUG_DEPTH_LIMIT => {
                    out.entry(key, &format_args!("..."));
                }
                Node::Map(child) => {
                    out.entry(
                        key,
                        &DebugTree {
                            map: child,
                            ancestors: ancestors.clone(),
                        },
                    );
                }
            }
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_map_is_empty() {
        let m = NestedMap::<i32>::new();
        assert!(m.is_empty());
        assert_eq!(m.len(), 0);
        assert!(m.keys().unwrap().is_empty());
    }

    #[test]
    fn test_set_and_get_leaf() {
        let m = NestedMap::new();
        m.set_leaf("a", 1).unwrap();
        assert_eq!(m.get_leaf("a").unwrap(), 1);
        m.set_leaf("a", 2).unwrap();
        assert_eq!(m.get_leaf("a").unwrap(), 2);
        assert_eq!(m.len(), 1);
        assert_eq!(m.kind_of("a").unwrap(), NodeKind::Leaf);
    }

    #[test]
    fn test_get_missing_key() {
        let m = NestedMap::<i32>::new();
        assert_eq!(m.get("x").unwrap_err(), Error::key_not_found("x"));
        assert_eq!(m.get("").unwrap_err(), Error::key_not_found(""));
        assert_eq!(m.kind_of("x").unwrap_err(), Error::key_not_found("x"));
    }

    #[test]
    fn test_empty_key_rejected_on_write() {
        let m = NestedMap::new();
        assert_eq!(m.set_leaf("", 1).unwrap_err(), Error::EmptyKey);
        assert_eq!(m.set_submap("", &NestedMap::new()).unwrap_err(), Error::EmptyKey);
        assert!(m.is_empty());
    }

    #[test]
    fn test_clone_aliases_storage() {
        let a = NestedMap::new();
        let b = a.clone();
        b.set_leaf("k", 5).unwrap();
        assert_eq!(a.get_leaf("k").unwrap(), 5);
        assert!(a.is_same(&b));
        assert_eq!(a, b);
        assert_eq!(a.handle_count(), 2);
    }

    #[test]
    fn test_independent_maps_differ() {
        let a = NestedMap::<i32>::new();
        let b = NestedMap::<i32>::new();
        assert!(!a.is_same(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_submap_aliases() {
        let root = NestedMap::new();
        let child = NestedMap::new();
        root.set_submap("c", &child).unwrap();
        child.set_leaf("x", 3).unwrap();
        let got = root.get_map("c").unwrap();
        assert!(got.is_same(&child));
        assert_eq!(got.get_leaf("x").unwrap(), 3);
    }

    #[test]
    fn test_get_path_errors() {
        let root = NestedMap::new();
        root.set_leaf("a", 1).unwrap();
        assert_eq!(root.get_path(Path::new()).unwrap_err(), Error::EmptyPath);
        assert_eq!(
            root.get_path(["a", "b"]).unwrap_err(),
            Error::invalid_path(&["a", "b"], 0, PathErrorReason::NotAMap)
        );
        assert_eq!(
            root.get_path(["z"]).unwrap_err(),
            Error::invalid_path(&["z"], 0, PathErrorReason::Missing)
        );
    }

    #[test]
    fn test_set_node_directly() {
        let m = NestedMap::new();
        m.set("leaf", Node::Leaf(1)).unwrap();
        m.set("map", Node::from(NestedMap::new())).unwrap();
        assert_eq!(
            m.child_keys().into_iter().collect::<Vec<_>>(),
            vec!["leaf".to_owned(), "map".to_owned()]
        );
        assert!(m.contains_key("map"));
        assert!(!m.contains_key("other"));
        assert_eq!(
            m.leaf_keys().into_iter().collect::<Vec<_>>(),
            vec!["leaf".to_owned()]
        );
    }

    fn deep_chain(depth: usize) -> NestedMap<i32> {
        let root = NestedMap::new();
        let segments: Vec<String> = (0..depth).map(|i| format!("d{i}")).collect();
        root.ensure_map_path(&segments)
            .unwrap()
            .set_leaf("leaf", 1)
            .unwrap();
        root
    }

    #[test]
    fn test_deep_tree_drops_without_overflow() {
        let root = deep_chain(100_000);
        assert_eq!(root.keys().unwrap().len(), 1);
        drop(root);
    }

    #[test]
    fn test_drop_keeps_shared_subtrees() {
        let root = NestedMap::new();
        let shared = root.ensure_map_path(["a", "b"]).unwrap();
        shared.set_leaf("x", 7).unwrap();
        let a = root.get_map("a").unwrap();
        drop(root);

        assert!(a.get_map("b").unwrap().is_same(&shared));
        assert_eq!(shared.get_leaf("x").unwrap(), 7);
        drop(a);
        assert_eq!(shared.handle_count(), 1);
        assert_eq!(shared.get_leaf("x").unwrap(), 7);
    }

    #[test]
    fn test_debug_elides_deep_levels() {
        let root = deep_chain(100_000);
        let text = format!("{root:?}");
        assert!(text.starts_with(r#"{"d0": {"d1": "#));
        assert!(text.contains("..."));
        assert!(!text.contains("leaf"));
    }

    #[test]
    fn test_debug_sorted_and_cycle_safe() {
        let root = NestedMap::new();
        let child = NestedMap::new();
        root.set_leaf("b", 2).unwrap();
        root.set_submap("a", &child).unwrap();
        child.set_leaf("x", 1).unwrap();
        assert_eq!(format!("{root:?}"), r#"{"a": {"x": 1}, "b": 2}"#);

        child.set_submap("up", &root).unwrap();
        assert_eq!(
            format!("{root:?}"),
            r#"{"a": {"up": <cycle>, "x": 1}, "b": 2}"#
        );
    }
}
