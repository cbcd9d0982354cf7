//! Fixed-width micro-kernel trait.
//!
//! A micro-kernel transposes a MICRO × MICRO tile of elements of type `T`.
//! MICRO is the number of elements that fill a 128-bit register.

pub mod scalar;

use super::TileStrides;

/// Fixed-width N×N transpose micro-kernel.
pub trait MicroKernel<T: Copy> {
    /// Micro-tile side length.
    const MICRO: usize;

    /// Macro-tile side length = MICRO * 4. Used as the dispatch tile size.
    const BLOCK: usize;

    /// Transpose a full MICRO × MICRO tile.
    ///
    /// # Safety
    /// `src` must be readable and `dst` writable at every offset
    /// `a*stride_a + b*stride_b` (plus `size_of::<T>()` bytes) for
    /// `a, b in 0..MICRO`.
    unsafe fn transpose_micro(src: *const u8, dst: *mut u8, strides: &TileStrides);
}

/// Marker type for portable (non-SIMD) micro-kernels.
pub struct ScalarKernel;

/// Move one `T` between byte addresses.
///
/// # Safety
/// Both addresses must be valid for `size_of::<T>()` bytes.
#[inline(always)]
pub(crate) unsafe fn move_element<T: Copy>(src: *const u8, dst: *mut u8) {
    let value = src.cast::<T>().read_unaligned();
    dst.cast::<T>().write_unaligned(value);
}
