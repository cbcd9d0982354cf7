//! Kernel dispatch table.
//!
//! Maps `(normalized element size, normalized rank)` to a parallelization
//! strategy, a tile shape and a compute primitive. Rank is a small closed set
//! known at setup time, so each supported rank is its own enum case.

use crate::ukernel::{MicroKernel, ScalarKernel};
use crate::BLOCK_MEMORY_SIZE;

/// How the iteration space is split into tiles for the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parallelization {
    /// Rank-1 linear copy, tiled over bytes.
    Tile1d,
    /// 2D range, both dimensions tiled.
    Tile2d,
    /// 3D range, two innermost dimensions tiled.
    Tile3d,
    Tile4d,
    Tile5d,
    Tile6d,
}

impl Parallelization {
    /// Dimensionality of the range handed to the executor.
    pub const fn dims(self) -> usize {
        match self {
            Parallelization::Tile1d => 1,
            Parallelization::Tile2d => 2,
            Parallelization::Tile3d => 3,
            Parallelization::Tile4d => 4,
            Parallelization::Tile5d => 5,
            Parallelization::Tile6d => 6,
        }
    }

    fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Parallelization::Tile1d),
            2 => Some(Parallelization::Tile2d),
            3 => Some(Parallelization::Tile3d),
            4 => Some(Parallelization::Tile4d),
            5 => Some(Parallelization::Tile5d),
            6 => Some(Parallelization::Tile6d),
            _ => None,
        }
    }
}

/// Fixed element widths with a dedicated micro-kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstWidth {
    X8,
    X16,
    X32,
}

/// The compute primitive a plan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ukernel {
    /// Contiguous copy of the single normalized element.
    Copy,
    /// Tiled transpose of 1-, 2- or 4-byte elements.
    TransposeConst(ConstWidth),
    /// Tiled transpose of opaque elements.
    TransposeVariable { element_size: usize },
}

impl Ukernel {
    pub fn is_copy(self) -> bool {
        matches!(self, Ukernel::Copy)
    }
}

/// Dispatch decision for one normalized problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelDispatch {
    pub parallelization: Parallelization,
    /// Tile extents of the two innermost loops (only `tile[0]` for `Tile1d`).
    pub tile: [usize; 2],
    pub ukernel: Ukernel,
}

/// Tile side for opaque elements.
pub const VARIABLE_TILE: usize = 16;

/// Select the kernel for a normalized problem.
///
/// Returns `None` for rank 0 or ranks above [`crate::MAX_RANK`], which setup
/// rejects before dispatch.
pub fn select_kernel(element_size: usize, rank: usize) -> Option<KernelDispatch> {
    let parallelization = Parallelization::for_rank(rank)?;

    if parallelization == Parallelization::Tile1d {
        return Some(KernelDispatch {
            parallelization,
            tile: [BLOCK_MEMORY_SIZE, 1],
            ukernel: Ukernel::Copy,
        });
    }

    let (ukernel, tile) = match element_size {
        1 => (
            Ukernel::TransposeConst(ConstWidth::X8),
            <ScalarKernel as MicroKernel<u8>>::BLOCK,
        ),
        2 => (
            Ukernel::TransposeConst(ConstWidth::X16),
            <ScalarKernel as MicroKernel<u16>>::BLOCK,
        ),
        4 => (
            Ukernel::TransposeConst(ConstWidth::X32),
            <ScalarKernel as MicroKernel<u32>>::BLOCK,
        ),
        n => (Ukernel::TransposeVariable { element_size: n }, VARIABLE_TILE),
    };

    Some(KernelDispatch {
        parallelization,
        tile: [tile, tile],
        ukernel,
    })
}
