//! Backend capability configuration.
//!
//! A [`Backend`] records which kernel families are usable. Callers build one
//! up front and hand a reference to every operator; operators check it on
//! `new` and again on every `run`.

use crate::error::{Result, TransposeError};
use crate::operator::OperatorType;

/// Capability bitmask of a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitFlags(u32);

impl InitFlags {
    /// The backend finished its own initialization.
    pub const INITIALIZED: InitFlags = InitFlags(1);
    /// Kernels for 1-byte elements.
    pub const X8: InitFlags = InitFlags(1 << 1);
    /// Kernels for 2-byte elements.
    pub const X16: InitFlags = InitFlags(1 << 2);
    /// Kernels for 4-byte elements.
    pub const X32: InitFlags = InitFlags(1 << 3);
    /// Kernels for opaque elements of any other width.
    pub const XX: InitFlags = InitFlags(1 << 4);

    pub const fn empty() -> Self {
        InitFlags(0)
    }

    pub const fn all() -> Self {
        InitFlags(
            Self::INITIALIZED.0 | Self::X8.0 | Self::X16.0 | Self::X32.0 | Self::XX.0,
        )
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: InitFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn without(self, other: InitFlags) -> Self {
        InitFlags(self.0 & !other.0)
    }
}

impl std::ops::BitOr for InitFlags {
    type Output = InitFlags;

    fn bitor(self, rhs: InitFlags) -> InitFlags {
        InitFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for InitFlags {
    fn bitor_assign(&mut self, rhs: InitFlags) {
        self.0 |= rhs.0;
    }
}

/// Element width class, selecting a kernel family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementWidth {
    X8,
    X16,
    X32,
    /// Opaque element of the given byte width.
    Xx(usize),
}

impl ElementWidth {
    pub const fn from_size(element_size: usize) -> Self {
        match element_size {
            1 => ElementWidth::X8,
            2 => ElementWidth::X16,
            4 => ElementWidth::X32,
            n => ElementWidth::Xx(n),
        }
    }

    pub const fn size(self) -> usize {
        match self {
            ElementWidth::X8 => 1,
            ElementWidth::X16 => 2,
            ElementWidth::X32 => 4,
            ElementWidth::Xx(n) => n,
        }
    }

    /// The capability bit this width requires.
    pub const fn required_flag(self) -> InitFlags {
        match self {
            ElementWidth::X8 => InitFlags::X8,
            ElementWidth::X16 => InitFlags::X16,
            ElementWidth::X32 => InitFlags::X32,
            ElementWidth::Xx(_) => InitFlags::XX,
        }
    }
}

impl std::fmt::Display for ElementWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementWidth::X8 => f.write_str("x8"),
            ElementWidth::X16 => f.write_str("x16"),
            ElementWidth::X32 => f.write_str("x32"),
            ElementWidth::Xx(n) => write!(f, "xx{n}"),
        }
    }
}

/// Kernel-family capabilities shared by all operators built against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend {
    flags: InitFlags,
}

impl Backend {
    /// A backend with every portable kernel family available.
    pub fn new() -> Self {
        Self::with_flags(InitFlags::all())
    }

    pub fn with_flags(flags: InitFlags) -> Self {
        log::debug!("backend configured with flags {:#07b}", flags.bits());
        Backend { flags }
    }

    pub fn flags(&self) -> InitFlags {
        self.flags
    }

    /// Fail fast unless the backend is initialized and provides the kernel
    /// family `operator` needs.
    pub(crate) fn check(&self, operator: OperatorType) -> Result<()> {
        if !self.flags.contains(InitFlags::INITIALIZED) {
            log::error!("failed to use {operator}: backend is not initialized");
            return Err(TransposeError::Uninitialized {
                operator,
                what: "backend",
            });
        }
        if !self.flags.contains(operator.width.required_flag()) {
            log::error!("failed to use {operator}: operations on this data type are not supported");
            return Err(TransposeError::UnsupportedHardware { operator });
        }
        Ok(())
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}
