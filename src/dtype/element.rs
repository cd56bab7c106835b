//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::Pod;

/// Trait for Rust scalars that can fill a leaf tensor
///
/// Connects Rust's type system to the runtime `DType` tag. Only conversion
/// is required; leaves are never computed on.
pub trait Element: Copy + Send + Sync + Pod + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert from f64 to this type (used by `Tensor::ones`)
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $ty
                }
            }
        )*
    };
}

impl_element! {
    f64 => F64,
    f32 => F32,
    i64 => I64,
    i32 => I32,
    i16 => I16,
    i8 => I8,
    u64 => U64,
    u32 => U32,
    u16 => U16,
    u8 => U8,
}

// bool is not Pod; boolean tensors are built from u8 bytes via `Tensor::from_bytes`.

#[cfg(feature = "f16")]
impl Element for half::f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn from_f64(v: f64) -> Self {
        half::f16::from_f64(v)
    }
}

#[cfg(feature = "f16")]
impl Element for half::bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn from_f64(v: f64) -> Self {
        half::bf16::from_f64(v)
    }
}
