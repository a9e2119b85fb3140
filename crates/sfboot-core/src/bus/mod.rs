//! Bus Transaction Engine
//!
//! The flash layers talk to the hardware through [`SpiBus`]: a half-duplex,
//! byte-oriented transfer with explicit chip-select control. [`XilinxSpi`]
//! implements it on top of the Xilinx AXI SPI register block, reached through
//! the [`Registers`] trait so the same engine runs on real MMIO ([`Mmio`]) and
//! against an emulated register file in tests.

mod mmio;
mod xilinx;

pub use mmio::{Mmio, Registers};
pub use xilinx::{regs, Spicr, SpiMode, Spisr, XilinxSpi, RX_DRAIN_BUDGET};

use bitflags::bitflags;

use crate::error::Result;

bitflags! {
    /// Chip-select sequencing for one [`SpiBus::transfer`] call
    ///
    /// A multi-phase exchange sets `BEGIN` on its first call and `END` on its
    /// last; the chip-select line stays asserted in between.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct XferFlags: u8 {
        /// Assert chip-select before shifting
        const BEGIN = 1 << 0;
        /// Deassert chip-select after shifting
        const END   = 1 << 1;
        /// Single-call transaction
        const ONCE  = Self::BEGIN.bits() | Self::END.bits();
    }
}

/// Microsecond busy-wait provided by the platform
pub trait Delay {
    /// Spin for at least `us` microseconds
    fn delay_us(&mut self, us: u32);
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Byte-level SPI transfer engine
pub trait SpiBus {
    /// Shift `bitlen` bits out of `dout` (or idle fill) and into `din` (or discard)
    ///
    /// `bitlen` must be a multiple of 8. Chip-select is asserted first when
    /// `flags` contains `BEGIN` and released afterwards when it contains `END`.
    fn transfer(
        &mut self,
        bitlen: usize,
        dout: Option<&[u8]>,
        din: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> Result<()>;

    /// Largest payload the engine accepts per program chunk, `None` if unlimited
    fn max_write_size(&self) -> Option<usize> {
        None
    }

    /// Hook run after every complete flash command
    fn release_bus(&mut self) {}

    /// Route the following commands to the upper part of a stacked pair
    ///
    /// Engines with a single chip-select ignore it.
    fn select_upper(&mut self, _upper: bool) {}

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<B: SpiBus + ?Sized> SpiBus for &mut B {
    fn transfer(
        &mut self,
        bitlen: usize,
        dout: Option<&[u8]>,
        din: Option<&mut [u8]>,
        flags: XferFlags,
    ) -> Result<()> {
        (**self).transfer(bitlen, dout, din, flags)
    }

    fn max_write_size(&self) -> Option<usize> {
        (**self).max_write_size()
    }

    fn release_bus(&mut self) {
        (**self).release_bus()
    }

    fn select_upper(&mut self, upper: bool) {
        (**self).select_upper(upper)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
