//! Operator lifecycle: create, set up, run.
//!
//! An operator is created once against a [`Backend`], then `setup` may be
//! called any number of times; each call discards the previous plan and
//! validates from scratch. `run` executes the latest plan.
//!
//! ```text
//! new() ──► Uninitialized ──setup──► Invalid ──ok──► Ready
//!                                       │   └─zero──► Skip
//!                                       └─err (stays Invalid)
//! ```

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

use crate::backend::{Backend, ElementWidth};
use crate::error::{invalid, InvalidParameter, Result, Side, TransposeError};
use crate::execute::execute;
use crate::plan::{build_plan, checked_product, required_len, ExecutionPlan};
use crate::threading::Parallelize;
use crate::MAX_RANK;

/// Which transform an operator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    TransposeNd,
    DepthToSpaceNhwc,
    DepthToSpaceNchw2Nhwc,
    SpaceToDepthNhwc,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatorKind::TransposeNd => "transpose_nd",
            OperatorKind::DepthToSpaceNhwc => "depth_to_space_nhwc",
            OperatorKind::DepthToSpaceNchw2Nhwc => "depth_to_space_nchw2nhwc",
            OperatorKind::SpaceToDepthNhwc => "space_to_depth_nhwc",
        };
        f.write_str(name)
    }
}

/// Transform kind and element width; tags every log line and error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorType {
    pub kind: OperatorKind,
    pub width: ElementWidth,
}

impl OperatorType {
    pub fn of<T: Pod>(kind: OperatorKind) -> Self {
        OperatorType {
            kind,
            width: ElementWidth::from_size(std::mem::size_of::<T>()),
        }
    }
}

impl fmt::Display for OperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.width)
    }
}

/// Lifecycle state of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, never set up.
    Uninitialized,
    /// The last setup failed.
    Invalid,
    Ready,
    /// The last setup described zero elements; `run` does nothing.
    Skip,
}

/// Untyped operator core shared by every transform.
#[derive(Debug)]
pub(crate) struct Operator<'b> {
    backend: &'b Backend,
    op_type: OperatorType,
    flags: u32,
    state: RunState,
    plan: Option<ExecutionPlan>,
}

impl<'b> Operator<'b> {
    pub(crate) fn new(backend: &'b Backend, op_type: OperatorType, flags: u32) -> Result<Self> {
        if op_type.width.size() == 0 {
            return Err(invalid(op_type, InvalidParameter::ZeroElementSize));
        }
        backend.check(op_type)?;
        Ok(Operator {
            backend,
            op_type,
            flags,
            state: RunState::Uninitialized,
            plan: None,
        })
    }

    pub(crate) fn op_type(&self) -> OperatorType {
        self.op_type
    }

    pub(crate) fn flags(&self) -> u32 {
        self.flags
    }

    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn plan(&self) -> Option<&ExecutionPlan> {
        self.plan.as_ref()
    }

    pub(crate) fn invalid(&self, reason: InvalidParameter) -> TransposeError {
        invalid(self.op_type, reason)
    }

    /// Product of `values`, or `SizeOverflow`.
    pub(crate) fn product(&self, values: &[usize]) -> Result<usize> {
        checked_product(values).ok_or_else(|| self.invalid(InvalidParameter::SizeOverflow))
    }

    /// Mark the operator invalid and drop the previous plan.
    pub(crate) fn reset(&mut self) {
        self.state = RunState::Invalid;
        self.plan = None;
    }

    /// Record a degenerate problem; `run` becomes a no-op.
    pub(crate) fn skip(&mut self) {
        self.state = RunState::Skip;
        self.plan = None;
    }

    /// Validate a transpose problem and store its plan.
    ///
    /// Strides are in elements; `input_stride` is in input order,
    /// `output_stride` in output order. `None` means packed.
    pub(crate) fn setup(
        &mut self,
        shape: &[usize],
        perm: &[usize],
        input_stride: Option<&[usize]>,
        output_stride: Option<&[usize]>,
    ) -> Result<()> {
        self.reset();
        self.validate(shape, perm, input_stride, output_stride)?;

        if shape.iter().any(|&n| n == 0) {
            log::debug!("{}: zero-sized shape {shape:?}, nothing to do", self.op_type);
            self.skip();
            return Ok(());
        }

        let plan = build_plan(self.op_type, perm, shape, input_stride, output_stride)?;
        self.plan = Some(plan);
        self.state = RunState::Ready;
        Ok(())
    }

    fn validate(
        &self,
        shape: &[usize],
        perm: &[usize],
        input_stride: Option<&[usize]>,
        output_stride: Option<&[usize]>,
    ) -> Result<()> {
        let rank = shape.len();
        if rank == 0 || rank > MAX_RANK {
            return Err(self.invalid(InvalidParameter::Rank(rank)));
        }
        if perm.len() != rank {
            return Err(self.invalid(InvalidParameter::PermLength {
                perm: perm.len(),
                rank,
            }));
        }
        for (i, &p) in perm.iter().enumerate() {
            if p >= rank {
                return Err(self.invalid(InvalidParameter::PermOutOfRange { value: p, rank }));
            }
            if perm[..i].contains(&p) {
                return Err(self.invalid(InvalidParameter::DuplicatePerm(p)));
            }
        }

        checked_product(shape)
            .and_then(|count| count.checked_mul(self.op_type.width.size()))
            .ok_or_else(|| self.invalid(InvalidParameter::SizeOverflow))?;

        if let Some(stride) = input_stride {
            self.validate_stride(Side::Input, shape, stride)?;
        }
        if let Some(stride) = output_stride {
            let output_shape: Vec<usize> = perm.iter().map(|&p| shape[p]).collect();
            self.validate_stride(Side::Output, &output_shape, stride)?;
        }
        Ok(())
    }

    /// Unit innermost stride, and each outer stride must step over
    /// everything inside it. The byte extent of the view and every byte
    /// stride must fit in `usize`.
    fn validate_stride(&self, side: Side, shape: &[usize], stride: &[usize]) -> Result<()> {
        let rank = shape.len();
        if stride.len() != rank {
            return Err(self.invalid(InvalidParameter::StrideLength {
                side,
                len: stride.len(),
                rank,
            }));
        }
        if stride[rank - 1] != 1 {
            return Err(self.invalid(InvalidParameter::InnerStride {
                side,
                stride: stride[rank - 1],
            }));
        }
        let overflow = || self.invalid(InvalidParameter::SizeOverflow);
        let mut inner = shape[rank - 1];
        for i in (1..rank).rev() {
            let required = stride[i]
                .checked_mul(shape[i])
                .ok_or_else(overflow)?
                .max(inner);
            if stride[i - 1] < required {
                return Err(self.invalid(InvalidParameter::StrideOverlap {
                    side,
                    dim: i - 1,
                    stride: stride[i - 1],
                    required,
                }));
            }
            inner = inner.checked_mul(shape[i - 1]).ok_or_else(overflow)?;
        }

        let es = self.op_type.width.size();
        let extent = required_len(shape, stride).and_then(|len| len.checked_mul(es));
        if extent.is_none() || stride.iter().any(|s| s.checked_mul(es).is_none()) {
            return Err(overflow());
        }
        Ok(())
    }

    /// Execute the stored plan over byte views of the caller's buffers.
    pub(crate) fn run<P: Parallelize + ?Sized>(
        &self,
        input: &[u8],
        output: &mut [u8],
        pool: &P,
    ) -> Result<()> {
        self.backend.check(self.op_type)?;
        match self.state {
            RunState::Skip => {
                log::trace!("{}: skipped run of empty problem", self.op_type);
                Ok(())
            }
            RunState::Ready => {
                let Some(plan) = self.plan.as_ref() else {
                    return Err(self.not_set_up());
                };
                let es = self.op_type.width.size();
                check_len(self, Side::Input, input.len() / es, plan.input_len)?;
                check_len(self, Side::Output, output.len() / es, plan.output_len)?;
                execute(plan, input, output, pool);
                Ok(())
            }
            RunState::Uninitialized | RunState::Invalid => Err(self.not_set_up()),
        }
    }

    fn not_set_up(&self) -> TransposeError {
        log::error!(
            "failed to run {}: operator has not been set up",
            self.op_type
        );
        TransposeError::Uninitialized {
            operator: self.op_type,
            what: "operator",
        }
    }
}

fn check_len(op: &Operator<'_>, side: Side, len: usize, required: usize) -> Result<()> {
    if len < required {
        return Err(op.invalid(InvalidParameter::BufferTooSmall {
            side,
            len,
            required,
        }));
    }
    Ok(())
}

/// N-dimensional transpose of `T` elements.
///
/// `T` fixes the element width: 1-, 2- and 4-byte types use the fixed-width
/// kernels, any other [`Pod`] type is moved as an opaque element.
///
/// ```
/// use strided_transpose::{Backend, Sequential, TransposeNd};
///
/// let backend = Backend::new();
/// let mut op = TransposeNd::<u32>::new(&backend, 0)?;
/// op.setup(&[2, 3], &[1, 0])?;
///
/// let input: Vec<u32> = (0..6).collect();
/// let mut output = vec![0u32; 6];
/// op.run(&input, &mut output, &Sequential)?;
/// assert_eq!(output, [0, 3, 1, 4, 2, 5]);
/// # Ok::<(), strided_transpose::TransposeError>(())
/// ```
#[derive(Debug)]
pub struct TransposeNd<'b, T: Pod> {
    core: Operator<'b>,
    _marker: PhantomData<T>,
}

impl<'b, T: Pod> TransposeNd<'b, T> {
    /// Create an operator. Fails if `backend` lacks the kernel family for `T`.
    pub fn new(backend: &'b Backend, flags: u32) -> Result<Self> {
        let core = Operator::new(backend, OperatorType::of::<T>(OperatorKind::TransposeNd), flags)?;
        Ok(TransposeNd {
            core,
            _marker: PhantomData,
        })
    }

    /// Plan a transpose of a packed `shape` tensor. Output dimension `i` is
    /// input dimension `perm[i]`.
    pub fn setup(&mut self, shape: &[usize], perm: &[usize]) -> Result<()> {
        self.core.setup(shape, perm, None, None)
    }

    /// Plan a transpose with explicit element strides. `input_stride` is in
    /// input dimension order, `output_stride` in output dimension order.
    pub fn setup_strided(
        &mut self,
        shape: &[usize],
        perm: &[usize],
        input_stride: Option<&[usize]>,
        output_stride: Option<&[usize]>,
    ) -> Result<()> {
        self.core.setup(shape, perm, input_stride, output_stride)
    }

    /// Move elements from `input` to `output` according to the current plan.
    pub fn run<P: Parallelize + ?Sized>(&self, input: &[T], output: &mut [T], pool: &P) -> Result<()> {
        self.core.run(
            bytemuck::cast_slice(input),
            bytemuck::cast_slice_mut(output),
            pool,
        )
    }

    pub fn state(&self) -> RunState {
        self.core.state()
    }

    pub fn operator_type(&self) -> OperatorType {
        self.core.op_type()
    }

    pub fn flags(&self) -> u32 {
        self.core.flags()
    }

    /// The plan built by the last successful setup, if any.
    pub fn plan(&self) -> Option<&ExecutionPlan> {
        self.core.plan()
    }
}

/// Create, set up and run a packed transpose in one call.
pub fn run_transpose_nd<T: Pod, P: Parallelize + ?Sized>(
    backend: &Backend,
    input: &[T],
    output: &mut [T],
    shape: &[usize],
    perm: &[usize],
    flags: u32,
    pool: &P,
) -> Result<()> {
    let mut op = TransposeNd::<T>::new(backend, flags)?;
    op.setup(shape, perm)?;
    op.run(input, output, pool)
}
