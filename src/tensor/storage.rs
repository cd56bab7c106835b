//! Storage: host memory with Arc-based sharing

use crate::dtype::DType;
use std::sync::Arc;

/// Immutable host buffer backing a leaf tensor
///
/// Storage wraps its bytes with reference counting, so cloning a tensor
/// (for example when reading it back out of a map) never copies data.
/// Memory is released when the last reference is dropped.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    bytes: Box<[u8]>,
    /// Number of elements (not bytes)
    len: usize,
    dtype: DType,
}

impl Storage {
    /// Create storage from raw bytes with explicit dtype
    ///
    /// The caller guarantees `data.len()` is a multiple of the dtype size.
    pub(crate) fn from_bytes(data: Vec<u8>, dtype: DType) -> Self {
        let len = data.len() / dtype.size_in_bytes();
        Self {
            inner: Arc::new(StorageInner {
                bytes: data.into_boxed_slice(),
                len,
                dtype,
            }),
        }
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.bytes.len()
    }

    /// Borrow the raw bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether two storages are the same allocation
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copy the contents out as typed elements
    pub(crate) fn to_vec<T: bytemuck::Pod>(&self) -> Vec<T> {
        // Allocate with correct alignment for T, then copy bytes in.
        // Casting the byte buffer directly could violate T's alignment.
        let mut result = vec![T::zeroed(); self.inner.len];
        let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut result);
        dst.copy_from_slice(&self.inner.bytes);
        result
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.inner.len)
            .field("dtype", &self.inner.dtype)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
