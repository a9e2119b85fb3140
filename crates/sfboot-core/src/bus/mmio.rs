//! Memory-mapped register access

/// 32-bit register file addressed by byte offset
///
/// Reads take `&mut self` because reading a data register pops a FIFO.
pub trait Registers {
    /// Read the 32-bit register at `offset`
    fn read32(&mut self, offset: usize) -> u32;

    /// Write the 32-bit register at `offset`
    fn write32(&mut self, offset: usize, value: u32);
}

impl<R: Registers + ?Sized> Registers for &mut R {
    fn read32(&mut self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }
}

/// Volatile access to a physical register block
pub struct Mmio {
    base: *mut u8,
}

impl Mmio {
    /// Wrap the register block at `base`
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    /// - `base` is the address of a mapped, 4-byte aligned register block
    /// - No other code is accessing the same block
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u8,
        }
    }

    /// Base address of the block
    pub fn base(&self) -> usize {
        self.base as usize
    }
}

impl Registers for Mmio {
    #[inline]
    fn read32(&mut self, offset: usize) -> u32 {
        debug_assert!(offset & 3 == 0, "unaligned 32-bit read");
        // SAFETY: `new` requires the block to be mapped and exclusively ours.
        unsafe { core::ptr::read_volatile(self.base.add(offset) as *const u32) }
    }

    #[inline]
    fn write32(&mut self, offset: usize, value: u32) {
        debug_assert!(offset & 3 == 0, "unaligned 32-bit write");
        // SAFETY: `new` requires the block to be mapped and exclusively ours.
        unsafe { core::ptr::write_volatile(self.base.add(offset) as *mut u32, value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmio_round_trip_on_ram() {
        let mut block = [0u32; 32];
        let mut regs = unsafe { Mmio::new(block.as_mut_ptr() as usize) };
        regs.write32(0x60, 0x86);
        assert_eq!(regs.read32(0x60), 0x86);
        assert_eq!(regs.read32(0x64), 0);
        assert_eq!(block[0x60 / 4], 0x86);
    }
}
