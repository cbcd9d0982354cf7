//! Strided N-dimensional transpose engine.
//!
//! Permutes tensors of rank 1..=6 between dense or padded strided layouts,
//! and builds depth-to-space and space-to-depth on top of the same engine by
//! describing them as synthetic higher-rank transposes.
//!
//! # Pipeline
//!
//! ```text
//! shape/perm/strides -> normalize -> loop order -> kernel dispatch -> tiled execution
//! ```
//!
//! - [`normalize`]: drop size-1 dims, fuse dims that stay packed and adjacent,
//!   fold a trailing contiguous run into a wider element
//! - [`order`]: put the input-contiguous and output-contiguous axes innermost
//! - [`kernel`]: pick a tile strategy and compute primitive per (element size, rank)
//! - [`threading`]: executors that run tiles sequentially or on a rayon pool
//!
//! # Operators
//!
//! - [`TransposeNd`]: generic permutation, packed or strided
//! - [`DepthToSpaceNhwc`], [`DepthToSpaceNchw2Nhwc`], [`SpaceToDepthNhwc`]
//! - [`run_transpose_nd`]: one-shot create + setup + run
//!
//! # Example
//!
//! ```rust
//! use strided_transpose::{run_transpose_nd, Backend, Sequential};
//!
//! let backend = Backend::new();
//! let input: Vec<f32> = (0..24).map(|x| x as f32).collect();
//! let mut output = vec![0.0f32; 24];
//!
//! // output[k][i][j] = input[i][j][k]
//! run_transpose_nd(&backend, &input, &mut output, &[2, 3, 4], &[2, 0, 1], 0, &Sequential)?;
//! assert_eq!(output[1], input[4]);
//! # Ok::<(), strided_transpose::TransposeError>(())
//! ```

pub mod backend;
pub mod depth_to_space;
pub mod error;
mod execute;
pub mod kernel;
pub mod normalize;
pub mod operator;
pub mod order;
pub mod plan;
pub mod space_to_depth;
pub mod threading;
pub mod ukernel;

pub use backend::{Backend, ElementWidth, InitFlags};
pub use depth_to_space::{DepthToSpaceConfig, DepthToSpaceNchw2Nhwc, DepthToSpaceNhwc};
pub use error::{InvalidParameter, Result, Side, TransposeError};
pub use kernel::{select_kernel, KernelDispatch, Parallelization, Ukernel};
pub use normalize::{canonicalize, normalize, NormalizedProblem};
pub use operator::{run_transpose_nd, OperatorKind, OperatorType, RunState, TransposeNd};
pub use order::{compute_loop_order, LoopNest};
pub use plan::ExecutionPlan;
pub use space_to_depth::{SpaceToDepthConfig, SpaceToDepthNhwc};
#[cfg(feature = "parallel")]
pub use threading::{RayonPool, MIN_PARALLEL_LEN};
pub use threading::{Parallelize, Sequential};

/// Highest supported tensor rank.
pub const MAX_RANK: usize = 6;

/// Bytes per tile of a rank-1 contiguous copy.
pub const BLOCK_MEMORY_SIZE: usize = 32 * 1024;
