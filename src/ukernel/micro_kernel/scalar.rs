//! Generic scalar micro-kernel implementations.
//!
//! Plain nested loops with compile-time trip counts, which LLVM unrolls and
//! vectorizes when the strides allow it.

use super::{move_element, MicroKernel, ScalarKernel};
use crate::ukernel::TileStrides;

macro_rules! scalar_micro_kernel {
    ($t:ty, $micro:literal) => {
        impl MicroKernel<$t> for ScalarKernel {
            const MICRO: usize = $micro;
            const BLOCK: usize = $micro * 4;

            #[inline(always)]
            unsafe fn transpose_micro(src: *const u8, dst: *mut u8, s: &TileStrides) {
                for b in 0..$micro {
                    for a in 0..$micro {
                        move_element::<$t>(
                            src.add(a * s.src_a + b * s.src_b),
                            dst.add(a * s.dst_a + b * s.dst_b),
                        );
                    }
                }
            }
        }
    };
}

scalar_micro_kernel!(u8, 16);
scalar_micro_kernel!(u16, 8);
scalar_micro_kernel!(u32, 4);
