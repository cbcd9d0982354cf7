//! Binds a plan to caller buffers and hands tile tasks to the executor.

use crate::kernel::{ConstWidth, Ukernel};
use crate::plan::ExecutionPlan;
use crate::threading::Parallelize;
use crate::ukernel::{copy_bytes, macro_kernel, macro_kernel_variable, TileStrides};
use crate::MAX_RANK;

/// Run `plan` from `input` into `output`.
///
/// The caller has checked both buffers against the plan's recorded lengths.
/// Raw addresses cross into tile tasks as `usize`; tiles write disjoint
/// output regions because validated strides never alias.
pub(crate) fn execute<P: Parallelize + ?Sized>(
    plan: &ExecutionPlan,
    input: &[u8],
    output: &mut [u8],
    pool: &P,
) {
    let src_addr = input.as_ptr() as usize;
    let dst_addr = output.as_mut_ptr() as usize;
    let dispatch = plan.dispatch;

    if dispatch.ukernel.is_copy() {
        let len = plan.normalized.element_size;
        pool.parallelize(
            &[len],
            &dispatch.tile[..1],
            &|start: &[usize], extent: &[usize]| unsafe {
                copy_bytes(src_addr as *const u8, dst_addr as *mut u8, start[0], extent[0]);
            },
        );
        return;
    }

    let nest = &plan.nest;
    let n = dispatch.parallelization.dims();
    debug_assert_eq!(n, nest.rank());
    let mut tile = [1usize; MAX_RANK];
    tile[n - 2] = dispatch.tile[0];
    tile[n - 1] = dispatch.tile[1];

    let strides = TileStrides {
        src_a: nest.input_stride[n - 2],
        src_b: nest.input_stride[n - 1],
        dst_a: nest.output_stride[n - 2],
        dst_b: nest.output_stride[n - 1],
    };
    let ukernel = dispatch.ukernel;

    // Tile offsets stay below the byte extents checked at setup, which the
    // caller's buffers cover.
    pool.parallelize(
        &nest.range[..n],
        &tile[..n],
        &|start: &[usize], extent: &[usize]| {
            let mut src_off = 0;
            let mut dst_off = 0;
            for (k, &i) in start.iter().enumerate() {
                src_off += i * nest.input_stride[k];
                dst_off += i * nest.output_stride[k];
            }
            let src = (src_addr + src_off) as *const u8;
            let dst = (dst_addr + dst_off) as *mut u8;
            unsafe { run_tile(ukernel, src, dst, &strides, extent[n - 2], extent[n - 1]) };
        },
    );
}

/// # Safety
/// Every element of the `block_a × block_b` tile must lie inside the bound
/// buffers.
#[inline]
unsafe fn run_tile(
    ukernel: Ukernel,
    src: *const u8,
    dst: *mut u8,
    strides: &TileStrides,
    block_a: usize,
    block_b: usize,
) {
    match ukernel {
        Ukernel::TransposeConst(ConstWidth::X8) => {
            macro_kernel::<u8>(src, dst, strides, block_a, block_b)
        }
        Ukernel::TransposeConst(ConstWidth::X16) => {
            macro_kernel::<u16>(src, dst, strides, block_a, block_b)
        }
        Ukernel::TransposeConst(ConstWidth::X32) => {
            macro_kernel::<u32>(src, dst, strides, block_a, block_b)
        }
        Ukernel::TransposeVariable { element_size } => {
            macro_kernel_variable(src, dst, strides, block_a, block_b, element_size)
        }
        // Rank-1 plans never reach the tiled path.
        Ukernel::Copy => {}
    }
}
