//! Nested, string-keyed containers of tensors
//!
//! A [`NestedMap`] maps non-empty string keys to [`Node`]s. A node is either a
//! leaf value or another `NestedMap`, so maps form an arbitrarily deep tree
//! that can be addressed one key at a time or with a multi-segment [`Path`].
//!
//! # Handle semantics
//!
//! A `NestedMap` is a handle to shared storage. Cloning it (or storing it
//! inside another map) aliases the storage rather than copying the tree:
//!
//! ```
//! use tensormap::prelude::*;
//!
//! let root = NestedMap::<Tensor>::new();
//! let alias = root.clone();
//! alias.set_leaf("w", Tensor::zeros(&[3], DType::F32))?;
//!
//! assert!(root.is_same(&alias));
//! assert!(root.get("w")?.is_leaf());
//! # Ok::<(), tensormap::error::Error>(())
//! ```

mod core;
mod node;
mod path;
mod traverse;

pub use core::{NestedMap, SharedStorage};
pub use node::{Node, NodeKind};
pub use path::Path;
