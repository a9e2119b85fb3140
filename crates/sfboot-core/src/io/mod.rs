//! Block I/O for the image loader
//!
//! Storage is reached through a fixed [`DevicePool`] of slots. Each slot holds
//! one backend implementing [`IoDevice`] and at most one open entity: a byte
//! [`Window`] onto the backend with its own cursor. The loader only ever
//! sees open/seek/read/close on entities.
//!
//! Backends:
//!
//! - [`SfDevice`] - SPI flash through the unaligned read translation layer
//! - [`MemmapDevice`] - memory-resident image

mod memmap;
mod pool;
mod reader;
mod sf;

pub use memmap::MemmapDevice;
pub use pool::{DevHandle, DevicePool, Entity, Rejected};
pub use reader::EntityReader;
pub use sf::{SfDevSpec, SfDevice, SfOps};

use crate::error::Result;

/// Number of backend connectors that may be registered
pub const MAX_IO_DEVICES: usize = 3;

/// Default number of pool slots
pub const MAX_IO_BLOCK_DEVICES: usize = 2;

/// A region: byte offset and length
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockSpec {
    /// Start of the region
    pub offset: usize,
    /// Length of the region
    pub length: usize,
}

impl BlockSpec {
    /// Create a region
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Check that both offset and length are multiples of `page_size`
    pub fn is_aligned(&self, page_size: usize) -> bool {
        page_size != 0 && self.offset % page_size == 0 && self.length % page_size == 0
    }
}

/// Seek origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// From the window start
    Set,
    /// From the current cursor
    Cur,
    /// From the window end (rejected by the pool)
    End,
}

/// Backend kind, used to register connectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoType {
    /// SPI flash
    Sf,
    /// Memory mapped image
    Memmap,
}

/// Identity of a platform-owned device spec
///
/// Two backends built on the same device spec share a key, and the pool
/// allows only one live slot per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecKey(usize);

impl SpecKey {
    /// Key of the device spec living at `spec`
    pub fn of<T: ?Sized>(spec: &T) -> Self {
        Self(spec as *const T as *const () as usize)
    }
}

/// The byte range an open entity is restricted to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    /// Absolute start
    pub base: usize,
    /// Length
    pub size: usize,
    /// Position relative to `base`
    pub cursor: usize,
}

impl Window {
    /// A window over `spec` with the cursor at its start
    pub fn new(spec: &BlockSpec) -> Self {
        Self {
            base: spec.offset,
            size: spec.length,
            cursor: 0,
        }
    }

    /// Absolute position of the cursor
    pub fn position(&self) -> usize {
        self.base + self.cursor
    }
}

/// Storage backend capability set
pub trait IoDevice {
    /// Backend kind
    fn io_type(&self) -> IoType;

    /// Identity of the device spec this backend was built from
    fn spec_key(&self) -> SpecKey;

    /// Alignment required of entity windows
    fn page_size(&self) -> usize;

    /// Validate the backend before it is bound to a pool slot
    fn dev_open(&mut self) -> Result<()>;

    /// Read `buf.len()` bytes at the window cursor, advancing it
    fn read(&mut self, window: &mut Window, buf: &mut [u8]) -> Result<usize>;

    /// Write `buf` at the window cursor
    fn write(&mut self, window: &mut Window, buf: &[u8]) -> Result<usize>;

    /// Called when the slot is released
    fn dev_close(&mut self) {}
}
