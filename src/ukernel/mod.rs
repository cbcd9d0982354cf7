//! Compute primitives consumed by the dispatch table.
//!
//! 1. Micro-kernel: an N×N tile transpose with fixed element width
//! 2. Macro-kernel: a BLOCK × BLOCK tile as a grid of micro-kernel calls
//! 3. Variable-width kernel for opaque elements
//! 4. Linear copy for rank-1 (pure memcpy) problems
//!
//! All kernels address memory through byte pointers and byte strides.
//! Element loads and stores are unaligned, so promoted elements (e.g. four
//! `u8` folded into one `u32`) need no alignment guarantees from the caller.

mod copy;
mod macro_kernel;
pub(crate) mod micro_kernel;

pub use copy::copy_bytes;
pub use macro_kernel::{macro_kernel, macro_kernel_variable};
pub use micro_kernel::{MicroKernel, ScalarKernel};

/// Byte strides of one 2D tile.
///
/// `a` is the second-to-last loop (input-contiguous), `b` the last loop
/// (output-contiguous). The kernels compute
/// `dst[a*dst_a + b*dst_b] = src[a*src_a + b*src_b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStrides {
    pub src_a: usize,
    pub src_b: usize,
    pub dst_a: usize,
    pub dst_b: usize,
}
