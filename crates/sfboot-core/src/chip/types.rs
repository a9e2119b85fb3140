//! Flash chip type definitions

use super::features::Features;

/// Longest ID response any table entry is matched against
pub const MAX_ID_LEN: usize = 6;

/// One entry of the ID/geometry table
///
/// `id` holds the JEDEC manufacturer byte, the two device bytes and up to
/// three extended bytes. Only the first `id_len` bytes take part in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashInfo {
    /// Part name
    pub name: &'static str,
    /// Raw ID bytes
    pub id: [u8; MAX_ID_LEN],
    /// Number of significant ID bytes (0 never matches)
    pub id_len: u8,
    /// Erase block size in bytes
    pub sector_size: u32,
    /// Number of erase blocks
    pub n_sectors: u32,
    /// Program page size in bytes
    pub page_size: u16,
    /// Capability flags
    pub flags: Features,
}

impl FlashInfo {
    /// Entry whose extended ID is at most two bytes
    ///
    /// A zero `ext_id` means the entry matches on the three JEDEC bytes only.
    pub const fn new(
        name: &'static str,
        jedec: u32,
        ext_id: u16,
        sector_size: u32,
        n_sectors: u32,
        flags: Features,
    ) -> Self {
        Self {
            name,
            id: [
                (jedec >> 16) as u8,
                (jedec >> 8) as u8,
                jedec as u8,
                (ext_id >> 8) as u8,
                ext_id as u8,
                0,
            ],
            id_len: if jedec == 0 {
                0
            } else if ext_id != 0 {
                5
            } else {
                3
            },
            sector_size,
            n_sectors,
            page_size: 256,
            flags,
        }
    }

    /// Entry matched on all six ID bytes
    pub const fn new6(
        name: &'static str,
        jedec: u32,
        ext_id: u32,
        sector_size: u32,
        n_sectors: u32,
        flags: Features,
    ) -> Self {
        Self {
            name,
            id: [
                (jedec >> 16) as u8,
                (jedec >> 8) as u8,
                jedec as u8,
                (ext_id >> 16) as u8,
                (ext_id >> 8) as u8,
                ext_id as u8,
            ],
            id_len: MAX_ID_LEN as u8,
            sector_size,
            n_sectors,
            page_size: 256,
            flags,
        }
    }

    /// Significant ID bytes
    pub fn id(&self) -> &[u8] {
        &self.id[..self.id_len as usize]
    }

    /// JEDEC manufacturer byte
    pub const fn jedec_mfr(&self) -> u8 {
        self.id[0]
    }

    /// Two JEDEC device bytes
    pub const fn jedec_id(&self) -> u16 {
        ((self.id[1] as u16) << 8) | self.id[2] as u16
    }

    /// First two extended ID bytes
    pub const fn jedec_ext(&self) -> u16 {
        ((self.id[3] as u16) << 8) | self.id[4] as u16
    }

    /// Total size of a single die in bytes
    pub const fn total_size(&self) -> u64 {
        self.sector_size as u64 * self.n_sectors as u64
    }

    /// Check whether a read-ID response identifies this part
    pub fn matches(&self, response: &[u8]) -> bool {
        self.id_len != 0 && response.starts_with(self.id())
    }

    /// Vendor name derived from the manufacturer byte
    pub fn vendor(&self) -> &'static str {
        manufacturer::name(self.jedec_mfr())
    }
}

/// JEDEC manufacturer IDs
pub mod manufacturer {
    /// Spansion (formerly AMD)
    pub const SPANSION: u8 = 0x01;
    /// Atmel
    pub const ATMEL: u8 = 0x1F;
    /// EON
    pub const EON: u8 = 0x1C;
    /// GigaDevice
    pub const GIGADEVICE: u8 = 0xC8;
    /// ISSI
    pub const ISSI: u8 = 0x9D;
    /// Macronix
    pub const MACRONIX: u8 = 0xC2;
    /// ST (now Micron)
    pub const STMICRO: u8 = 0x20;
    /// Sanyo
    pub const SANYO: u8 = 0x62;
    /// SST
    pub const SST: u8 = 0xBF;
    /// Winbond
    pub const WINBOND: u8 = 0xEF;

    /// Human readable vendor name
    pub fn name(mfr: u8) -> &'static str {
        match mfr {
            SPANSION => "Spansion",
            ATMEL => "Atmel",
            EON => "EON",
            GIGADEVICE => "GigaDevice",
            ISSI => "ISSI",
            MACRONIX => "Macronix",
            STMICRO => "Micron",
            SANYO => "Sanyo",
            SST => "SST",
            WINBOND => "Winbond",
            _ => "Unknown",
        }
    }
}
