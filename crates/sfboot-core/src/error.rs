//! Error types for sfboot-core
//!
//! This module provides a no_std compatible error type shared by every layer
//! of the stack, from the register-level transfer engine up to the device pool.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// Transfer length is not a whole number of bytes
    SpiTransferFailed,
    /// Stale receive data could not be drained before a transfer
    RxFifoNotEmpty,
    /// A byte was shifted out but nothing came back in time
    SpiTimeout,

    // Chip errors
    /// Flash chip not found (ID read failed or unknown)
    ChipNotFound,
    /// Quad enable requested for a vendor without a known sequence
    UnsupportedVendor,
    /// Quad enable bit did not stick
    QuadEnableFailed,

    // Operation errors
    /// Flash stayed busy past its timeout
    Timeout,
    /// Flash has not been scanned yet
    NotReady,

    // Address/size errors
    /// Address is beyond flash chip size
    AddressOutOfBounds,
    /// Offset or length is not a multiple of the erase unit
    InvalidAlignment,
    /// Provided buffer is too small for the operation
    BufferTooSmall,

    // Protection errors
    /// Lock check reported the target range as protected
    RegionProtected,

    // I/O layer errors
    /// Argument rejected (alignment, seek mode, bounds)
    InvalidArgument,
    /// Fixed-size pool or registry is full
    NoSpace,
    /// Device or entity is already in use
    Busy,
    /// Handle does not refer to a live slot
    NotFound,
    /// No connector registered for this device type
    NotRegistered,
    /// Underlying read failed or returned nothing
    IoError,

    // Image errors
    /// Firmware image package is malformed
    InvalidImage,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer is not a multiple of 8 bits"),
            Self::RxFifoNotEmpty => write!(f, "SPI receive FIFO not empty"),
            Self::SpiTimeout => write!(f, "SPI transfer timed out"),
            Self::ChipNotFound => write!(f, "flash chip not found"),
            Self::UnsupportedVendor => write!(f, "unsupported vendor"),
            Self::QuadEnableFailed => write!(f, "quad enable bit not set"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::NotReady => write!(f, "flash not scanned"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "misaligned request"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::RegionProtected => write!(f, "region is protected"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::NoSpace => write!(f, "no space left in device pool"),
            Self::Busy => write!(f, "device busy"),
            Self::NotFound => write!(f, "no such device"),
            Self::NotRegistered => write!(f, "no connector registered for device type"),
            Self::IoError => write!(f, "I/O error"),
            Self::InvalidImage => write!(f, "invalid firmware image package"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;

        match self {
            Self::SpiTimeout | Self::Timeout => ErrorKind::TimedOut,
            Self::InvalidArgument
            | Self::InvalidAlignment
            | Self::AddressOutOfBounds
            | Self::BufferTooSmall => ErrorKind::InvalidInput,
            Self::InvalidImage => ErrorKind::InvalidData,
            Self::NoSpace => ErrorKind::OutOfMemory,
            Self::NotFound | Self::NotRegistered | Self::ChipNotFound => ErrorKind::NotFound,
            Self::UnsupportedVendor => ErrorKind::Unsupported,
            Self::RegionProtected => ErrorKind::PermissionDenied,
            Self::Busy => ErrorKind::AddrInUse,
            _ => ErrorKind::Other,
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
