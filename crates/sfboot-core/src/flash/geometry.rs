//! Geometry derived from an ID table entry

use crate::chip::{FlashInfo, Features};
use crate::config::FlashConfig;
use crate::spi::{opcodes, AddressWidth};

use super::{Addressing, DualFlash};

/// Span reachable with a 3-byte address
pub const BANK_SIZE: u32 = 16 << 20;

/// Everything the driver needs to talk to an identified part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Matched table entry
    pub info: &'static FlashInfo,
    /// Program page size in bytes
    pub page_size: u32,
    /// Erase unit in bytes (equal to `erase_size`)
    pub sector_size: u32,
    /// Bytes cleared by one `erase_cmd`
    pub erase_size: u32,
    /// Total addressable size in bytes
    pub size: u32,
    /// Erase opcode
    pub erase_cmd: u8,
    /// Array read opcode
    pub read_cmd: u8,
    /// Page program opcode
    pub write_cmd: u8,
    /// Dummy bytes after the read address
    pub dummy_bytes: u8,
    /// Also poll the flag status register for readiness
    pub use_fsr: bool,
    /// 1 for a parallel dual pair, otherwise 0
    pub shift: u8,
    /// Dual flash wiring
    pub dual: DualFlash,
    /// Address bytes in command frames
    pub addr_width: AddressWidth,
}

impl Geometry {
    /// Compute the geometry of `info` under `config`
    pub fn derive(info: &'static FlashInfo, config: &FlashConfig) -> Self {
        let shift: u8 = if config.dual_flash == DualFlash::Parallel { 1 } else { 0 };

        // S25FL032P/S25FL064P keep 256 byte pages despite the 0x4d00 extended id
        let mut page_size = info.page_size as u32;
        if info.jedec_ext() == 0x4d00 && info.jedec_id() != 0x0215 && info.jedec_id() != 0x0216 {
            page_size = 512;
        }
        page_size <<= shift;

        let sector_size = info.sector_size << shift;
        let mut size = (sector_size * info.n_sectors) << shift;
        if config.dual_flash == DualFlash::Stacked {
            size <<= 1;
        }

        let (erase_cmd, erase_size) =
            if config.use_4k_sectors && info.flags.contains(Features::SECT_4K) {
                (opcodes::SE_20, 4096 << shift)
            } else {
                (opcodes::BE_D8, sector_size)
            };

        let addr_width = if config.addressing == Addressing::FourByte && size > BANK_SIZE {
            AddressWidth::FourByte
        } else {
            AddressWidth::ThreeByte
        };

        Self {
            info,
            page_size,
            sector_size: erase_size,
            erase_size,
            size,
            erase_cmd,
            read_cmd: config.read_cmd.opcode(),
            write_cmd: config.write_cmd.opcode(),
            dummy_bytes: config.read_cmd.dummy_bytes(),
            use_fsr: info.flags.contains(Features::E_FSR),
            shift,
            dual: config.dual_flash,
            addr_width,
        }
    }

    /// Part name
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// Bytes covered by one bank register value
    pub fn bank_span(&self) -> u32 {
        BANK_SIZE << self.shift
    }

    /// Check that `[offset, offset + len)` lies inside the part
    pub fn contains(&self, offset: u32, len: usize) -> bool {
        offset as u64 + len as u64 <= self.size as u64
    }
}
