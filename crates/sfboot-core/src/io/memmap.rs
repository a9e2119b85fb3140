//! Memory-resident backend

use crate::error::{Error, Result};

use super::{IoDevice, IoType, SpecKey, Window};

/// Backend over an image already present in memory
///
/// Window offsets index straight into the slice. Reads and writes are byte
/// granular.
pub struct MemmapDevice<'a> {
    mem: &'a mut [u8],
}

impl<'a> MemmapDevice<'a> {
    /// Wrap a memory region
    pub fn new(mem: &'a mut [u8]) -> Self {
        Self { mem }
    }

    fn span(&self, window: &Window, len: usize) -> Result<core::ops::Range<usize>> {
        let start = window.position();
        match start.checked_add(len) {
            Some(end) if end <= self.mem.len() => Ok(start..end),
            _ => {
                log::error!("memmap access {:#x}+{:#x} outside image", start, len);
                Err(Error::AddressOutOfBounds)
            }
        }
    }
}

impl IoDevice for MemmapDevice<'_> {
    fn io_type(&self) -> IoType {
        IoType::Memmap
    }

    fn spec_key(&self) -> SpecKey {
        SpecKey::of(&*self.mem)
    }

    fn page_size(&self) -> usize {
        1
    }

    fn dev_open(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self, window: &mut Window, buf: &mut [u8]) -> Result<usize> {
        let range = self.span(window, buf.len())?;
        buf.copy_from_slice(&self.mem[range]);
        window.cursor += buf.len();
        Ok(buf.len())
    }

    fn write(&mut self, window: &mut Window, buf: &[u8]) -> Result<usize> {
        let range = self.span(window, buf.len())?;
        self.mem[range].copy_from_slice(buf);
        window.cursor += buf.len();
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BlockSpec;

    #[test]
    fn test_read_write_through_window() {
        let mut mem = [0u8; 64];
        let mut dev = MemmapDevice::new(&mut mem);
        let mut window = Window::new(&BlockSpec::new(16, 32));

        assert_eq!(dev.write(&mut window, &[1, 2, 3, 4]), Ok(4));
        assert_eq!(window.cursor, 4);

        window.cursor = 0;
        let mut buf = [0u8; 4];
        assert_eq!(dev.read(&mut window, &mut buf), Ok(4));
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(&mem[16..20], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_access_outside_image() {
        let mut mem = [0u8; 64];
        let mut dev = MemmapDevice::new(&mut mem);
        let mut window = Window::new(&BlockSpec::new(60, 8));
        let mut buf = [0u8; 8];
        assert_eq!(dev.read(&mut window, &mut buf), Err(Error::AddressOutOfBounds));
        assert_eq!(window.cursor, 0);
    }
}
