//! Space-to-depth as a synthetic strided transpose.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::backend::Backend;
use crate::error::{InvalidParameter, Result, Side};
use crate::operator::{Operator, OperatorKind, OperatorType, RunState};
use crate::plan::ExecutionPlan;
use crate::threading::Parallelize;

/// Static configuration of a space-to-depth operator. Strides are pixel
/// strides in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceToDepthConfig {
    pub input_channels: usize,
    pub input_stride: usize,
    pub output_stride: usize,
    pub block_size: u32,
    pub flags: u32,
}

impl SpaceToDepthConfig {
    pub fn packed(input_channels: usize, block_size: u32) -> Self {
        let b = block_size as usize;
        SpaceToDepthConfig {
            input_channels,
            input_stride: input_channels,
            output_stride: b.saturating_mul(b).saturating_mul(input_channels),
            block_size,
            flags: 0,
        }
    }
}

/// Space-to-depth from NHWC to NHWC.
///
/// Input `[N, H, W, C]`, output `[N, H/b, W/b, b·b·C]` with output channels
/// laid out as `[block_y][block_x][C]`.
#[derive(Debug)]
pub struct SpaceToDepthNhwc<'b, T: Pod> {
    core: Operator<'b>,
    config: SpaceToDepthConfig,
    _marker: PhantomData<T>,
}

impl<'b, T: Pod> SpaceToDepthNhwc<'b, T> {
    pub fn new(backend: &'b Backend, config: SpaceToDepthConfig) -> Result<Self> {
        let op_type = OperatorType::of::<T>(OperatorKind::SpaceToDepthNhwc);
        let core = Operator::new(backend, op_type, config.flags)?;

        if config.input_channels == 0 {
            return Err(core.invalid(InvalidParameter::ZeroChannels));
        }
        if config.input_stride < config.input_channels {
            return Err(core.invalid(InvalidParameter::PixelStride {
                side: Side::Input,
                stride: config.input_stride,
                required: config.input_channels,
            }));
        }
        if config.block_size <= 1 {
            return Err(core.invalid(InvalidParameter::BlockSize(config.block_size)));
        }
        let b = config.block_size as usize;
        let required = core.product(&[b, b, config.input_channels])?;
        if config.output_stride < required {
            return Err(core.invalid(InvalidParameter::PixelStride {
                side: Side::Output,
                stride: config.output_stride,
                required,
            }));
        }

        Ok(SpaceToDepthNhwc {
            core,
            config,
            _marker: PhantomData,
        })
    }

    /// Plan for an input of `batch × height × width` pixels. Height and width
    /// must be multiples of the block size.
    pub fn setup(&mut self, batch: usize, height: usize, width: usize) -> Result<()> {
        self.core.reset();
        let block_size = self.config.block_size;
        let b = block_size as usize;
        if height == 0 || width == 0 {
            return Err(self
                .core
                .invalid(InvalidParameter::ZeroSpatial { height, width }));
        }
        if height % b != 0 || width % b != 0 {
            return Err(self.core.invalid(InvalidParameter::SpatialNotDivisible {
                height,
                width,
                block_size,
            }));
        }
        if batch == 0 {
            self.core.skip();
            return Ok(());
        }

        let c = self.config.input_channels;
        let ips = self.config.input_stride;
        let ops = self.config.output_stride;
        let out_width = width / b;

        let product = |values: &[usize]| self.core.product(values);
        let shape = [product(&[batch, height / b])?, b, out_width, b, c];
        let perm = [0, 2, 1, 3, 4];
        let input_stride = [
            product(&[b, width, ips])?,
            product(&[width, ips])?,
            product(&[b, ips])?,
            ips,
            1,
        ];
        let output_stride = [product(&[out_width, ops])?, ops, product(&[b, c])?, c, 1];
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

    pub fn config(&self) -> &SpaceToDepthConfig {
        &self.config
    }

    pub fn plan(&self) -> Option<&ExecutionPlan> {
        self.core.plan()
    }
}
