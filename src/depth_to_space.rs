//! Depth-to-space as a synthetic strided transpose.
//!
//! Each input pixel holds `block_size² · C` channels laid out as
//! `[block_y][block_x][C]`; the transform scatters them into a
//! `block_size × block_size` patch of `C`-channel output pixels.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::backend::Backend;
use crate::error::{InvalidParameter, Result, Side};
use crate::operator::{Operator, OperatorKind, OperatorType, RunState};
use crate::plan::ExecutionPlan;
use crate::threading::Parallelize;

/// Static configuration of a depth-to-space operator.
///
/// Strides are in elements. For [`DepthToSpaceNhwc`] they are pixel strides
/// of the NHWC input and output. For [`DepthToSpaceNchw2Nhwc`] the input
/// stride counts channel planes per batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthToSpaceConfig {
    pub output_channels: usize,
    pub input_stride: usize,
    pub output_stride: usize,
    pub block_size: u32,
    pub flags: u32,
}

impl DepthToSpaceConfig {
    /// Densely packed input and output. A pixel size that overflows
    /// saturates and is rejected at create.
    pub fn packed(output_channels: usize, block_size: u32) -> Self {
        let b = block_size as usize;
        DepthToSpaceConfig {
            output_channels,
            input_stride: b.saturating_mul(b).saturating_mul(output_channels),
            output_stride: output_channels,
            block_size,
            flags: 0,
        }
    }

    fn validate(&self, op: &Operator<'_>) -> Result<()> {
        if self.output_channels == 0 {
            return Err(op.invalid(InvalidParameter::ZeroChannels));
        }
        if self.output_stride < self.output_channels {
            return Err(op.invalid(InvalidParameter::PixelStride {
                side: Side::Output,
                stride: self.output_stride,
                required: self.output_channels,
            }));
        }
        if self.block_size <= 1 {
            return Err(op.invalid(InvalidParameter::BlockSize(self.block_size)));
        }
        let b = self.block_size as usize;
        let required = op.product(&[b, b, self.output_channels])?;
        if self.input_stride < required {
            return Err(op.invalid(InvalidParameter::PixelStride {
                side: Side::Input,
                stride: self.input_stride,
                required,
            }));
        }
        Ok(())
    }
}

fn check_spatial(op: &Operator<'_>, height: usize, width: usize) -> Result<()> {
    if height == 0 || width == 0 {
        return Err(op.invalid(InvalidParameter::ZeroSpatial { height, width }));
    }
    Ok(())
}

fn create<'b>(
    backend: &'b Backend,
    op_type: OperatorType,
    config: &DepthToSpaceConfig,
) -> Result<Operator<'b>> {
    let core = Operator::new(backend, op_type, config.flags)?;
    config.validate(&core)?;
    Ok(core)
}

/// Depth-to-space from NHWC to NHWC.
///
/// Input `[N, H, W, b·b·C]`, output `[N, H·b, W·b, C]`.
#[derive(Debug)]
pub struct DepthToSpaceNhwc<'b, T: Pod> {
    core: Operator<'b>,
    config: DepthToSpaceConfig,
    _marker: PhantomData<T>,
}

impl<'b, T: Pod> DepthToSpaceNhwc<'b, T> {
    pub fn new(backend: &'b Backend, config: DepthToSpaceConfig) -> Result<Self> {
        let op_type = OperatorType::of::<T>(OperatorKind::DepthToSpaceNhwc);
        Ok(DepthToSpaceNhwc {
            core: create(backend, op_type, &config)?,
            config,
            _marker: PhantomData,
        })
    }

    /// Plan for an input of `batch × height × width` pixels.
    pub fn setup(&mut self, batch: usize, height: usize, width: usize) -> Result<()> {
        self.core.reset();
        check_spatial(&self.core, height, width)?;
        if batch == 0 {
            self.core.skip();
            return Ok(());
        }

        let c = self.config.output_channels;
        let ips = self.config.input_stride;
        let ops = self.config.output_stride;
        let b = self.config.block_size as usize;

        let product = |values: &[usize]| self.core.product(values);
        let shape = [product(&[batch, height])?, width, b, b, c];
        let perm = [0, 2, 1, 3, 4];
        let input_stride = [product(&[width, ips])?, ips, product(&[b, c])?, c, 1];
        let output_stride = [
            product(&[b, width, b, ops])?,
            product(&[width, b, ops])?,
            product(&[b, ops])?,
            ops,
            1,
        ];
        self.core
            .setup(&shape, &perm, Some(&input_stride), Some(&output_stride))
    }

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

    pub fn config(&self) -> &DepthToSpaceConfig {
        &self.config
    }

    pub fn plan(&self) -> Option<&ExecutionPlan> {
        self.core.plan()
    }
}

/// Depth-to-space from NCHW to NHWC.
///
/// Input `[N, b·b·C, H, W]`, output `[N, H·b, W·b, C]`.
#[derive(Debug)]
pub struct DepthToSpaceNchw2Nhwc<'b, T: Pod> {
    core: Operator<'b>,
    config: DepthToSpaceConfig,
    _marker: PhantomData<T>,
}

impl<'b, T: Pod> DepthToSpaceNchw2Nhwc<'b, T> {
    pub fn new(backend: &'b Backend, config: DepthToSpaceConfig) -> Result<Self> {
        let op_type = OperatorType::of::<T>(OperatorKind::DepthToSpaceNchw2Nhwc);
        Ok(DepthToSpaceNchw2Nhwc {
            core: create(backend, op_type, &config)?,
            config,
            _marker: PhantomData,
        })
    }

    /// Plan for an input of `batch` images of `height × width` pixels.
    pub fn setup(&mut self, batch: usize, height: usize, width: usize) -> Result<()> {
        self.core.reset();
        check_spatial(&self.core, height, width)?;
        if batch == 0 {
            self.core.skip();
            return Ok(());
        }

        let c = self.config.output_channels;
        let ips = self.config.input_stride;
        let ops = self.config.output_stride;
        let b = self.config.block_size as usize;
        let product = |values: &[usize]| self.core.product(values);
        let plane = product(&[height, width])?;

        let shape = [batch, b, b, c, height, width];
        let perm = [0, 4, 1, 5, 2, 3];
        let input_stride = [
            product(&[ips, plane])?,
            product(&[b, c, plane])?,
            product(&[c, plane])?,
            plane,
            width,
            1,
        ];
        let output_stride = [
            product(&[height, b, width, b, ops])?,
            product(&[b, width, b, ops])?,
            product(&[width, b, ops])?,
            product(&[b, ops])?,
            ops,
            1,
        ];
        self.core
            .setup(&shape, &perm, Some(&input_stride), Some(&output_stride))
    }

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

    pub fn config(&self) -> &DepthToSpaceConfig {
        &self.config
    }

    pub fn plan(&self) -> Option<&ExecutionPlan> {
        self.core.plan()
    }
}
