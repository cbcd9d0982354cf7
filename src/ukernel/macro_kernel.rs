//! Macro-kernel: processes a tile of up to BLOCK × BLOCK elements using a
//! grid of micro-kernels, with scalar loops for the edge remainders.

use super::micro_kernel::{move_element, MicroKernel, ScalarKernel};
use super::TileStrides;

/// Transpose a `block_a × block_b` tile of fixed-width elements.
///
/// - `src`/`dst` point at element `(0, 0)` of the tile.
/// - `a` runs along the input-contiguous loop, `b` along the
///   output-contiguous loop.
///
/// # Safety
/// `src` must be readable and `dst` writable at every element addressed by
/// `strides` for `a < block_a`, `b < block_b`, and the two regions must not
/// overlap.
#[inline]
pub unsafe fn macro_kernel<T: Copy>(
    src: *const u8,
    dst: *mut u8,
    strides: &TileStrides,
    block_a: usize,
    block_b: usize,
) where
    ScalarKernel: MicroKernel<T>,
{
    let micro = <ScalarKernel as MicroKernel<T>>::MICRO;
    let s = strides;

    let full_a = block_a / micro * micro;
    let full_b = block_b / micro * micro;

    // Full MICRO × MICRO tiles
    let mut b = 0;
    while b < full_b {
        let mut a = 0;
        while a < full_a {
            <ScalarKernel as MicroKernel<T>>::transpose_micro(
                src.add(a * s.src_a + b * s.src_b),
                dst.add(a * s.dst_a + b * s.dst_b),
                s,
            );
            a += micro;
        }
        // Remainder along a
        scalar_rect::<T>(src, dst, s, full_a..block_a, b..b + micro);
        b += micro;
    }

    // Remainder along b, including the corner
    scalar_rect::<T>(src, dst, s, 0..block_a, full_b..block_b);
}

#[inline(always)]
unsafe fn scalar_rect<T: Copy>(
    src: *const u8,
    dst: *mut u8,
    s: &TileStrides,
    a_range: std::ops::Range<usize>,
    b_range: std::ops::Range<usize>,
) {
    for b in b_range {
        for a in a_range.clone() {
            move_element::<T>(
                src.add(a * s.src_a + b * s.src_b),
                dst.add(a * s.dst_a + b * s.dst_b),
            );
        }
    }
}

/// Transpose a `block_a × block_b` tile of opaque `element_size`-byte elements.
///
/// # Safety
/// Same requirements as [`macro_kernel`], with `element_size` bytes per element.
#[inline]
pub unsafe fn macro_kernel_variable(
    src: *const u8,
    dst: *mut u8,
    strides: &TileStrides,
    block_a: usize,
    block_b: usize,
    element_size: usize,
) {
    let s = strides;
    for b in 0..block_b {
        let src_row = src.add(b * s.src_b);
        let dst_col = dst.add(b * s.dst_b);
        for a in 0..block_a {
            std::ptr::copy_nonoverlapping(
                src_row.add(a * s.src_a),
                dst_col.add(a * s.dst_a),
                element_size,
            );
        }
    }
}
