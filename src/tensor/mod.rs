//! Leaf tensor type
//!
//! `Tensor` is the opaque value stored at the leaves of a
//! [`NestedMap`](crate::map::NestedMap): a fixed-shape, immutable host
//! buffer with a runtime element type. The container never computes on it.

mod core;
mod shape;
mod storage;

pub use core::{Tensor, TensorId};
pub use shape::Shape;
pub use storage::Storage;
