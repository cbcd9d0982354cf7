//! Loop ordering for normalized transposes.

use std::collections::TryReserveError;

use crate::normalize::NormalizedProblem;

/// Compute the iteration order over the dimensions of a normalized problem.
///
/// Starts from output order (`perm`), so the innermost loop walks the output's
/// contiguous axis. If the input's contiguous axis (the last input dimension)
/// sits further out than the last two positions, it is swapped into the
/// second-to-last slot. The two innermost loops then read and write
/// sequentially, and those are the two loops the kernels tile.
///
/// This is a single greedy swap, not a search over all orders.
pub fn compute_loop_order(perm: &[usize]) -> Vec<usize> {
    let rank = perm.len();
    let mut order = perm.to_vec();
    if rank <= 2 {
        return order;
    }
    let last = rank - 1;
    if let Some(i) = order[..rank - 2].iter().position(|&d| d == last) {
        order.swap(i, rank - 2);
    }
    order
}

/// Iteration extents and byte strides laid out in loop order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopNest {
    pub order: Vec<usize>,
    pub range: Vec<usize>,
    pub input_stride: Vec<usize>,
    pub output_stride: Vec<usize>,
}

impl LoopNest {
    /// Gather extents and strides of `problem` by `order`.
    pub fn new(problem: &NormalizedProblem, order: Vec<usize>) -> Result<Self, TryReserveError> {
        let range = gather(&order, |d| problem.shape[d])?;
        let input_stride = gather(&order, |d| problem.input_stride[d])?;
        let output_stride = gather(&order, |d| problem.output_stride_of(d))?;
        Ok(LoopNest {
            order,
            range,
            input_stride,
            output_stride,
        })
    }

    pub fn rank(&self) -> usize {
        self.range.len()
    }

    pub fn total_len(&self) -> usize {
        self.range.iter().product()
    }
}

fn gather(order: &[usize], f: impl Fn(usize) -> usize) -> Result<Vec<usize>, TryReserveError> {
    let mut out = Vec::new();
    out.try_reserve_exact(order.len())?;
    out.extend(order.iter().map(|&d| f(d)));
    Ok(out)
}
