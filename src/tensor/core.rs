//! Core Tensor type and its identity token

use super::{Shape, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of leaf identities; zero is never handed out
static LEAF_IDS: AtomicU64 = AtomicU64::new(1);

/// Identity of a leaf tensor
///
/// Minted when a tensor is constructed and copied into every clone, so a
/// tensor read back out of a map compares equal to the one stored. Two
/// tensors built separately never share an id, even with identical data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(u64);

impl TensorId {
    fn mint() -> Self {
        Self(LEAF_IDS.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value; later constructions get larger values
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor#{}", self.0)
    }
}

/// Fixed-shape numeric buffer stored as a map leaf
///
/// A `Tensor` consists of:
/// - **Storage**: reference-counted, immutable host memory
/// - **Shape**: dimensions, fixed at construction
/// - **Id**: identity token assigned at construction
///
/// Cloning is cheap and keeps both the buffer and the id, so clones are
/// [`is_same`](Tensor::is_same) as the original. There is no arithmetic.
///
/// # Example
///
/// ```
/// use tensormap::prelude::*;
///
/// let t = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2])?;
/// assert_eq!(t.shape(), &[2, 2]);
/// assert!(t.is_same(&t.clone()));
/// # Ok::<(), tensormap::error::Error>(())
/// ```
#[derive(Clone)]
pub struct Tensor {
    id: TensorId,
    storage: Storage,
    shape: Shape,
}

/// Element count and byte size of `shape`, or `InvalidArgument` on overflow
fn checked_sizes(shape: &[usize], dtype: DType) -> Result<(usize, usize)> {
    let overflow = || Error::InvalidArgument {
        arg: "shape",
        reason: format!("{shape:?} of {dtype} elements exceeds the addressable size"),
    };
    let numel = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(overflow)?;
    let bytes = numel
        .checked_mul(dtype.size_in_bytes())
        .ok_or_else(overflow)?;
    Ok((numel, bytes))
}

impl Tensor {
    /// Create a tensor from a slice of data
    ///
    /// Returns `ShapeMismatch` if `data.len()` does not equal the product of
    /// the `shape` dimensions, and `InvalidArgument` if that product
    /// overflows `usize`.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        let (expected_len, _) = checked_sizes(shape, T::DTYPE)?;
        if data.len() != expected_len {
            return Err(Error::shape_mismatch(shape, &[data.len()]));
        }

        let bytes = bytemuck::cast_slice::<T, u8>(data).to_vec();
        Ok(Self::from_parts(Storage::from_bytes(bytes, T::DTYPE), shape.into()))
    }

    /// Create a tensor from raw bytes with explicit dtype
    ///
    /// `data` must hold exactly `numel * dtype.size_in_bytes()` bytes.
    pub fn from_bytes(data: &[u8], shape: &[usize], dtype: DType) -> Result<Self> {
        let (numel, expected) = checked_sizes(shape, dtype)?;
        if data.len() != expected {
            return Err(Error::InvalidArgument {
                arg: "data",
                reason: format!(
                    "expected {expected} bytes for {numel} {dtype} elements, got {}",
                    data.len()
                ),
            });
        }

        Ok(Self::from_parts(
            Storage::from_bytes(data.to_vec(), dtype),
            shape.into(),
        ))
    }

    /// Create a tensor filled with zeros
    ///
    /// All-zero bits are zero for every supported dtype.
    ///
    /// # Panics
    ///
    /// Panics if the byte size of `shape` overflows `usize`.
    /// For a fallible alternative, use [`Self::try_zeros`].
    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        Self::try_zeros(shape, dtype).expect("Tensor::zeros failed")
    }

    /// Create a tensor filled with zeros (fallible version)
    pub fn try_zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        let (_, size) = checked_sizes(shape, dtype)?;
        let bytes = vec![0u8; size];
        Ok(Self::from_parts(Storage::from_bytes(bytes, dtype), shape.into()))
    }

    /// Create a tensor filled with ones
    ///
    /// # Panics
    ///
    /// Same limit as [`Self::full`].
    pub fn ones<T: Element>(shape: &[usize]) -> Self {
        Self::full(shape, T::from_f64(1.0))
    }

    /// Create a tensor filled with a single value
    ///
    /// # Panics
    ///
    /// Panics if the byte size of `shape` overflows `usize`.
    /// For a fallible alternative, use [`Self::try_full`].
    pub fn full<T: Element>(shape: &[usize], value: T) -> Self {
        Self::try_full(shape, value).expect("Tensor::full failed")
    }

    /// Create a tensor filled with a single value (fallible version)
    pub fn try_full<T: Element>(shape: &[usize], value: T) -> Result<Self> {
        let (numel, _) = checked_sizes(shape, T::DTYPE)?;
        let bytes = bytemuck::cast_slice::<T, u8>(&vec![value; numel]).to_vec();
        Ok(Self::from_parts(
            Storage::from_bytes(bytes, T::DTYPE),
            shape.into(),
        ))
    }

    fn from_parts(storage: Storage, shape: Shape) -> Self {
        Self {
            id: TensorId::mint(),
            storage,
            shape,
        }
    }

    // ===== Accessors =====

    /// Get the tensor ID
    #[inline]
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.shape.as_slice()
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.elem_count()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.storage.size_in_bytes()
    }

    /// Identity comparison: true iff `other` is this tensor or a clone of it
    #[inline]
    pub fn is_same(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// Copy the contents out as a typed vector
    ///
    /// Fails with `DTypeMismatch` if `T` does not match the stored dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype(),
                rhs: T::DTYPE,
            });
        }
        Ok(self.storage.to_vec())
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id)
            .field("shape", &self.shape)
            .field("dtype", &self.dtype())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice() {
        let t = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.numel(), 6);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.size_in_bytes(), 24);
        assert_eq!(t.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_from_slice_shape_mismatch() {
        let err = Tensor::from_slice(&[1i32, 2, 3], &[2, 2]).unwrap_err();
        assert_eq!(err, Error::shape_mismatch(&[2, 2], &[3]));
    }

    #[test]
    fn test_from_bytes_length_checked() {
        assert!(Tensor::from_bytes(&[1, 0, 1], &[3], DType::Bool).is_ok());
        assert!(matches!(
            Tensor::from_bytes(&[0; 7], &[2], DType::F32),
            Err(Error::InvalidArgument { arg: "data", .. })
        ));
    }

    #[test]
    fn test_fill_constructors() {
        assert_eq!(
            Tensor::zeros(&[3], DType::I64).to_vec::<i64>().unwrap(),
            vec![0, 0, 0]
        );
        assert_eq!(Tensor::ones::<f64>(&[2]).to_vec::<f64>().unwrap(), vec![1.0, 1.0]);
        assert_eq!(Tensor::full(&[2, 1], 7u8).to_vec::<u8>().unwrap(), vec![7, 7]);
    }

    #[test]
    fn test_scalar_tensor() {
        let t = Tensor::full(&[], 3.5f32);
        assert_eq!(t.ndim(), 0);
        assert_eq!(t.numel(), 1);
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let huge = [usize::MAX, 2];
        let expect_shape_error = |err: Error| {
            assert!(
                matches!(err, Error::InvalidArgument { arg: "shape", .. }),
                "unexpected error: {err:?}"
            )
        };
        expect_shape_error(Tensor::from_slice(&[1.0f32], &huge).unwrap_err());
        expect_shape_error(Tensor::from_bytes(&[0u8; 4], &huge, DType::U8).unwrap_err());
        expect_shape_error(Tensor::try_zeros(&huge, DType::U8).unwrap_err());
        expect_shape_error(Tensor::try_full(&[usize::MAX / 2, 1], 0u32).unwrap_err());
    }

    #[test]
    #[should_panic(expected = "Tensor::zeros failed")]
    fn test_zeros_panics_on_overflow() {
        let _ = Tensor::zeros(&[usize::MAX, usize::MAX], DType::F64);
    }

    #[test]
    fn test_ids_unique_and_increasing() {
        let a = Tensor::zeros(&[1], DType::U8);
        let b = Tensor::zeros(&[1], DType::U8);
        assert_ne!(a.id(), b.id());
        assert!(b.id().as_u64() > a.id().as_u64());
        assert_eq!(a.clone().id(), a.id());
        assert_eq!(a.id().to_string(), format!("tensor#{}", a.id().as_u64()));
    }

    #[test]
    fn test_clone_is_same() {
        let a = Tensor::zeros(&[4], DType::F32);
        let b = a.clone();
        let c = Tensor::zeros(&[4], DType::F32);
        assert!(a.is_same(&b));
        assert!(b.storage().ptr_eq(a.storage()));
        assert!(!a.is_same(&c));
    }

    #[test]
    fn test_to_vec_dtype_mismatch() {
        let t = Tensor::zeros(&[2], DType::F32);
        assert_eq!(
            t.to_vec::<f64>().unwrap_err(),
            Error::DTypeMismatch {
                lhs: DType::F32,
                rhs: DType::F64
            }
        );
    }
}
