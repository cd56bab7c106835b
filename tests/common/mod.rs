//! Common test utilities
#![allow(dead_code)]

use tensormap::prelude::*;

/// Three-element f32 tensor filled with `value`
pub fn vec3(value: f32) -> Tensor {
    Tensor::full(&[3], value)
}

/// Build a path from string segments
pub fn path(segments: &[&str]) -> Path {
    segments.iter().copied().collect()
}

/// Leaf paths of `map`, rendered as `a/b/c` for compact assertions
pub fn key_strings(map: &NestedMap) -> Vec<String> {
    map.keys()
        .expect("keys() failed")
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Assert a node is a leaf holding exactly `expected`
pub fn assert_leaf_is(node: Node, expected: &Tensor, msg: &str) {
    let leaf = node.into_leaf().unwrap_or_else(|e| panic!("{msg}: {e}"));
    assert!(
        leaf.is_same(expected),
        "{}: got {:?}, expected {:?}",
        msg,
        leaf.id(),
        expected.id()
    );
}
