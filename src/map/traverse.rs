//! Path resolution and leaf enumeration
//!
//! Both walks are iterative: resolution is bounded by the length of the
//! caller's path, enumeration keeps its own work stack, so neither grows the
//! call stack with tree depth.

use super::{NestedMap, Node, Path};
use crate::error::{Error, PathErrorReason, Result};
use std::collections::{BTreeSet, HashSet};
use std::vec::IntoIter;

/// Follow `path[..depth]` from `root`, requiring every segment to be a map
///
/// Errors name the full `path` so callers see which segment failed.
pub(crate) fn descend<T, S: AsRef<str>>(
    root: &NestedMap<T>,
    path: &[S],
    depth: usize,
) -> Result<NestedMap<T>> {
    let mut current = root.clone();
    for (index, segment) in path[..depth].iter().enumerate() {
        let next = {
            let guard = current.storage().read();
            match guard.get(segment.as_ref()) {
                Some(Node::Map(map)) => map.clone(),
                Some(Node::Leaf(_)) => {
                    return Err(path_error(path, index, PathErrorReason::NotAMap));
                }
                None => return Err(path_error(path, index, PathErrorReason::Missing)),
            }
        };
        current = next;
    }
    Ok(current)
}

/// Follow `path` from `root`, creating empty maps for absent segments
///
/// Existing segments are checked first, so a leaf anywhere along the path
/// fails the call before any map is created.
pub(crate) fn descend_or_create<T, S: AsRef<str>>(
    root: &NestedMap<T>,
    path: &[S],
) -> Result<NestedMap<T>> {
    let mut current = root.clone();
    let mut existing = 0;
    for (index, segment) in path.iter().enumerate() {
        let next = {
            let guard = current.storage().read();
            match guard.get(segment.as_ref()) {
                Some(Node::Map(map)) => map.clone(),
                Some(Node::Leaf(_)) => {
                    return Err(path_error(path, index, PathErrorReason::NotAMap));
                }
                None => break,
            }
        };
        current = next;
        existing = index + 1;
    }

    for (index, segment) in path.iter().enumerate().skip(existing) {
        let next = {
            let mut guard = current.storage().write();
            match guard.get(segment.as_ref()) {
                Some(Node::Map(map)) => map.clone(),
                // Another handle wrote a leaf here since the check above.
                Some(Node::Leaf(_)) => {
                    return Err(path_error(path, index, PathErrorReason::NotAMap));
                }
                None => {
                    let created = NestedMap::new();
                    guard.insert(segment.as_ref().to_owned(), Node::Map(created.clone()));
                    tracing::trace!(key = segment.as_ref(), index, "created intermediate map");
                    created
                }
            }
        };
        current = next;
    }
    Ok(current)
}

fn path_error<S: AsRef<str>>(path: &[S], index: usize, reason: PathErrorReason) -> Error {
    let err = Error::invalid_path(path, index, reason);
    tracing::debug!(error = %err, "path traversal failed");
    err
}

struct Frame<T> {
    id: usize,
    children: IntoIter<(String, Option<NestedMap<T>>)>,
}

/// Snapshot of a map's entries: leaves as `None`, submaps as their handle
fn children_of<T>(map: &NestedMap<T>) -> IntoIter<(String, Option<NestedMap<T>>)> {
    let guard = map.storage().read();
    let children: Vec<_> = guard
        .iter()
        .map(|(key, node)| (key.clone(), node.as_map().cloned()))
        .collect();
    children.into_iter()
}

/// Every root-to-leaf path below `root`
///
/// Depth-first. A storage identity already on the current root-to-node chain
/// means the tree contains itself, which fails with `CyclicStructure`. The
/// same subtree reached through two different keys is not a cycle and is
/// reported under both.
///
/// One prefix is shared by the whole walk: a segment is pushed when a frame
/// is entered and popped when it is exhausted, so only emitted paths are
/// allocated.
pub(crate) fn leaf_paths<T>(root: &NestedMap<T>) -> Result<BTreeSet<Path>> {
    let mut result = BTreeSet::new();
    let mut ancestors = HashSet::new();
    ancestors.insert(root.storage_id());

    let mut prefix = Path::new();
    let mut stack = vec![Frame {
        id: root.storage_id(),
        children: children_of(root),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some((key, child)) = frame.children.next() else {
            if let Some(done) = stack.pop() {
                ancestors.remove(&done.id);
            }
            // The root frame has no segment of its own; popping empty is a no-op.
            prefix.pop();
            continue;
        };

        match child {
            None => {
                result.insert(prefix.join(key));
            }
            Some(map) => {
                let id = map.storage_id();
                if !ancestors.insert(id) {
                    let path = prefix.join(key);
                    tracing::debug!(path = %path, "cycle detected while enumerating keys");
                    return Err(Error::CyclicStructure { path });
                }
                prefix.push(key);
                stack.push(Frame {
                    id,
                    children: children_of(&map),
                });
            }
        }
    }

    Ok(result)
}
