//! # tensormap
//!
//! **Nested, string-keyed containers of tensors with shared-handle semantics.**
//!
//! A [`NestedMap`](map::NestedMap) maps keys to either a leaf value (by
//! default a [`Tensor`](tensor::Tensor)) or another `NestedMap`, forming a
//! tree that can be addressed one key at a time or by a multi-segment path.
//!
//! ## Features
//!
//! - **Handles, not values**: cloning a map or assigning it under a key
//!   aliases its storage; mutation through any alias is visible through all
//! - **Path access**: `get_path`, `set_leaf_path`, `set_submap_path` walk
//!   any number of levels and fail cleanly on missing or non-map segments
//! - **Enumeration**: `keys` lists every root-to-leaf path, detecting cycles
//! - **Opaque leaves**: the container stores and returns leaves, it never
//!   computes on them; any `Clone` type can be a leaf
//!
//! ## Quick Start
//!
//! ```
//! use tensormap::prelude::*;
//!
//! let model = NestedMap::new();
//! model.set_leaf("bias", Tensor::zeros(&[8], DType::F32))?;
//! model.ensure_map_path(["encoder", "layer0"])?;
//! model.set_leaf_path(["encoder", "layer0", "weight"], Tensor::ones::<f32>(&[8, 8]))?;
//!
//! let paths: Vec<String> = model.keys()?.iter().map(|p| p.to_string()).collect();
//! assert_eq!(paths, ["bias", "encoder/layer0/weight"]);
//! # Ok::<(), tensormap::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `f16`: Half-precision element types (`half::f16`, `half::bf16`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod map;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, PathErrorReason, Result};
    pub use crate::map::{NestedMap, Node, NodeKind, Path};
    pub use crate::tensor::{Shape, Tensor, TensorId};
}
