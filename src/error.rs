use crate::operator::OperatorType;

/// Which side of a transpose a stride or buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Input => f.write_str("input"),
            Side::Output => f.write_str("output"),
        }
    }
}

/// The precise parameter violation behind [`TransposeError::InvalidParameter`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParameter {
    #[error("rank {0} is outside 1..=6")]
    Rank(usize),

    #[error("perm has {perm} entries but the shape has rank {rank}")]
    PermLength { perm: usize, rank: usize },

    #[error("perm entry {value} is out of range for rank {rank}")]
    PermOutOfRange { value: usize, rank: usize },

    #[error("duplicate entry {0} in perm")]
    DuplicatePerm(usize),

    #[error("{side} stride has {len} entries but the shape has rank {rank}")]
    StrideLength { side: Side, len: usize, rank: usize },

    #[error("{side} stride of the innermost dimension is {stride}, expected 1")]
    InnerStride { side: Side, stride: usize },

    #[error("{side} stride {stride} at dimension {dim} overlaps the {required} elements inside it")]
    StrideOverlap {
        side: Side,
        dim: usize,
        stride: usize,
        required: usize,
    },

    #[error("element type has zero size")]
    ZeroElementSize,

    #[error("shape, stride or channel arithmetic overflows usize")]
    SizeOverflow,

    #[error("block size {0} must be greater than 1")]
    BlockSize(u32),

    #[error("number of channels must be non-zero")]
    ZeroChannels,

    #[error("{side} pixel stride {stride} is smaller than the {required} channels it holds")]
    PixelStride {
        side: Side,
        stride: usize,
        required: usize,
    },

    #[error("input dimensions {height}x{width} must be non-zero")]
    ZeroSpatial { height: usize, width: usize },

    #[error("input dimensions {height}x{width} are not divisible by block size {block_size}")]
    SpatialNotDivisible {
        height: usize,
        width: usize,
        block_size: u32,
    },

    #[error("{side} buffer holds {len} elements but the plan addresses {required}")]
    BufferTooSmall {
        side: Side,
        len: usize,
        required: usize,
    },
}

/// Errors returned by operator creation, setup and execution.
#[derive(Debug, thiserror::Error)]
pub enum TransposeError {
    /// The backend was not initialized, or the operator was run before a
    /// successful setup.
    #[error("{operator}: {what} is not initialized")]
    Uninitialized {
        operator: OperatorType,
        what: &'static str,
    },

    /// Plan storage could not be reserved.
    #[error("failed to allocate {bytes} bytes for {operator} execution plan")]
    OutOfMemory { operator: OperatorType, bytes: usize },

    #[error("invalid parameter for {operator}: {reason}")]
    InvalidParameter {
        operator: OperatorType,
        reason: InvalidParameter,
    },

    /// The backend does not provide the kernel family for this element width.
    #[error("{operator} is not supported by the configured backend")]
    UnsupportedHardware { operator: OperatorType },
}

impl TransposeError {
    /// The violated parameter, if this is an `InvalidParameter` error.
    pub fn invalid_parameter(&self) -> Option<&InvalidParameter> {
        match self {
            TransposeError::InvalidParameter { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Result type for operator calls.
pub type Result<T> = std::result::Result<T, TransposeError>;

/// Log and build an `InvalidParameter` error.
pub(crate) fn invalid(operator: OperatorType, reason: InvalidParameter) -> TransposeError {
    log::error!("invalid parameter for {operator}: {reason}");
    TransposeError::InvalidParameter { operator, reason }
}
