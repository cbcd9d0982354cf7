//! Execution plan construction: normalize, order loops, select a kernel.

use crate::error::{invalid, InvalidParameter, Result, TransposeError};
use crate::kernel::{select_kernel, KernelDispatch};
use crate::normalize::{normalize, NormalizedProblem};
use crate::operator::OperatorType;
use crate::order::{compute_loop_order, LoopNest};

/// Everything `run` needs to move one problem's elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub normalized: NormalizedProblem,
    pub nest: LoopNest,
    pub dispatch: KernelDispatch,
    /// Minimum input buffer length in elements.
    pub input_len: usize,
    /// Minimum output buffer length in elements.
    pub output_len: usize,
}

/// Number of elements a strided view spans, from element 0 to its last
/// addressed element. Zero for an empty view, `None` on overflow.
pub fn required_len(shape: &[usize], stride: &[usize]) -> Option<usize> {
    if shape.iter().any(|&n| n == 0) {
        return Some(0);
    }
    let mut last = 0usize;
    for (&n, &s) in shape.iter().zip(stride) {
        last = last.checked_add((n - 1).checked_mul(s)?)?;
    }
    last.checked_add(1)
}

/// Product of `values`, `None` on overflow.
pub fn checked_product(values: &[usize]) -> Option<usize> {
    values.iter().try_fold(1usize, |acc, &v| acc.checked_mul(v))
}

/// Build the plan for a validated, non-degenerate problem.
///
/// Strides are in elements, `None` meaning packed.
pub(crate) fn build_plan(
    operator: OperatorType,
    perm: &[usize],
    shape: &[usize],
    input_stride: Option<&[usize]>,
    output_stride: Option<&[usize]>,
) -> Result<ExecutionPlan> {
    let element_size = operator.width.size();
    let normalized = normalize(element_size, perm, shape, input_stride, output_stride);

    let order = compute_loop_order(&normalized.perm);
    let nest = LoopNest::new(&normalized, order).map_err(|_| {
        let bytes = 4 * normalized.rank() * std::mem::size_of::<usize>();
        log::error!("failed to allocate {bytes} bytes for {operator} execution plan");
        TransposeError::OutOfMemory { operator, bytes }
    })?;

    let dispatch = select_kernel(normalized.element_size, normalized.rank())
        .ok_or_else(|| invalid(operator, InvalidParameter::Rank(normalized.rank())))?;

    let overflow = || invalid(operator, InvalidParameter::SizeOverflow);
    let input_len = match input_stride {
        Some(s) => required_len(shape, s),
        None => checked_product(shape),
    }
    .ok_or_else(overflow)?;
    let output_len = match output_stride {
        Some(s) => {
            let output_shape: Vec<usize> = perm.iter().map(|&p| shape[p]).collect();
            required_len(&output_shape, s)
        }
        None => checked_product(shape),
    }
    .ok_or_else(overflow)?;

    log::debug!(
        "{operator}: normalized rank {} to {} with element size {} bytes, loop order {:?}, {:?}",
        shape.len(),
        normalized.rank(),
        normalized.element_size,
        nest.order,
        dispatch.ukernel,
    );

    Ok(ExecutionPlan {
        normalized,
        nest,
        dispatch,
        input_len,
        output_len,
    })
}
