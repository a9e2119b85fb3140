//! Flash chip capability flags

use bitflags::bitflags;

bitflags! {
    /// Capability flags carried by every ID table entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u16 {
        /// Has 4KB sector erase (0x20)
        const SECT_4K   = 1 << 0;
        /// Has 32KB block erase (0x52)
        const SECT_32K  = 1 << 1;
        /// Busy state must also be polled through the flag status register
        const E_FSR     = 1 << 2;
        /// SST byte/word programming
        const SST_WR    = 1 << 3;
        /// Quad page program (0x32)
        const WR_QPP    = 1 << 4;
        /// Quad output fast read (0x6B)
        const RD_QUAD   = 1 << 5;
        /// Dual output fast read (0x3B)
        const RD_DUAL   = 1 << 6;
        /// Quad I/O fast read (0xEB)
        const RD_QUADIO = 1 << 7;
        /// Dual I/O fast read (0xBB)
        const RD_DUALIO = 1 << 8;
        /// Every read mode
        const RD_FULL   = Self::RD_QUAD.bits()
            | Self::RD_DUAL.bits()
            | Self::RD_QUADIO.bits()
            | Self::RD_DUALIO.bits();
    }
}

impl Features {
    /// Check if any quad command is available
    pub fn has_quad(&self) -> bool {
        self.intersects(Self::RD_QUAD | Self::RD_QUADIO | Self::WR_QPP)
    }
}
