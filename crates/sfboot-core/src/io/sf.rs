//! SPI flash backend: the unaligned read translation layer
//!
//! Every raw transfer lands in a page-aligned scratch buffer first, and only
//! the bytes the caller asked for are copied out. A request larger than the
//! scratch buffer is serviced as a series of scratch-sized fetches; the raw
//! read may return fewer bytes than requested and the returned count is what
//! advances the cursor.

use crate::error::{Error, Result};

use super::{BlockSpec, IoDevice, IoType, SpecKey, Window};

/// Raw flash access used by the translation layer
pub trait SfOps {
    /// Read up to `buf.len()` bytes at `offset`, returning the count read
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize>;

    /// Write `buf` at `offset`, returning the count written
    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<usize>;
}

impl<T: SfOps + ?Sized> SfOps for &mut T {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize> {
        (**self).read(offset, buf)
    }

    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<usize> {
        (**self).write(offset, buf)
    }
}

/// Platform description of a flash device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfDevSpec {
    /// Location and length of the scratch buffer
    pub buffer: BlockSpec,
    /// Alignment of the scratch buffer and of entity windows
    pub page_size: usize,
}

/// Flash backend bound to a device spec, a scratch buffer and raw ops
pub struct SfDevice<'a, O> {
    spec: &'a SfDevSpec,
    scratch: &'a mut [u8],
    ops: O,
}

impl<'a, O: SfOps> SfDevice<'a, O> {
    /// Create a backend; `scratch` must be `spec.buffer.length` bytes
    pub fn new(spec: &'a SfDevSpec, scratch: &'a mut [u8], ops: O) -> Self {
        Self { spec, scratch, ops }
    }

    /// The device spec this backend was built from
    pub fn spec(&self) -> &'a SfDevSpec {
        self.spec
    }

    /// Borrow the raw ops
    pub fn ops_mut(&mut self) -> &mut O {
        &mut self.ops
    }
}

impl<O: SfOps> IoDevice for SfDevice<'_, O> {
    fn io_type(&self) -> IoType {
        IoType::Sf
    }

    fn spec_key(&self) -> SpecKey {
        SpecKey::of(self.spec)
    }

    fn page_size(&self) -> usize {
        self.spec.page_size
    }

    fn dev_open(&mut self) -> Result<()> {
        let page_size = self.spec.page_size;
        if !page_size.is_power_of_two() {
            log::error!("sf page size {:#x} is not a power of two", page_size);
            return Err(Error::InvalidArgument);
        }
        let buffer = &self.spec.buffer;
        if buffer.length == 0 || !buffer.is_aligned(page_size) {
            log::error!(
                "sf scratch buffer {:#x}+{:#x} not aligned to {:#x}",
                buffer.offset,
                buffer.length,
                page_size
            );
            return Err(Error::InvalidArgument);
        }
        if self.scratch.len() != buffer.length {
            log::error!(
                "sf scratch is {:#x} bytes, expected {:#x}",
                self.scratch.len(),
                buffer.length
            );
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    fn read(&mut self, window: &mut Window, buf: &mut [u8]) -> Result<usize> {
        let mut done = 0;
        while done < buf.len() {
            let offset = window.position();
            let request = (buf.len() - done).min(self.scratch.len());
            let addr = u32::try_from(offset).map_err(|_| Error::IoError)?;

            let got = match self.ops.read(addr, &mut self.scratch[..request]) {
                Ok(n) if n > 0 && n <= request => n,
                Ok(n) => {
                    log::error!("sf read {:#x}+{:#x} returned {:#x}", offset, request, n);
                    return Err(Error::IoError);
                }
                Err(e) => {
                    log::error!("sf read {:#x}+{:#x} failed: {}", offset, request, e);
                    return Err(Error::IoError);
                }
            };

            buf[done..done + got].copy_from_slice(&self.scratch[..got]);
            window.cursor += got;
            done += got;
        }
        Ok(done)
    }

    fn write(&mut self, _window: &mut Window, _buf: &[u8]) -> Result<usize> {
        log::warn!("Unsupported for sf write");
        Ok(0)
    }
}
