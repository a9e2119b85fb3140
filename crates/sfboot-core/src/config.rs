//! Platform configuration
//!
//! Every tunable the stack consumes: bus clock, flash timeouts and command
//! choice, page size, scratch buffer and FIP window. [`Default`] reproduces
//! the qserver board. With the `std` feature the whole record can be loaded
//! from TOML; missing keys fall back to the defaults.

use crate::flash::{Addressing, DualFlash, ReadCommand, WriteCommand};
use crate::io::BlockSpec;

/// Base of DDR on qserver; the scratch buffer lives at its start
pub const DDR_BASE: usize = 0x4000_0000;

/// Serial flash page size used for window and scratch alignment
pub const SF_PAGE_SIZE: usize = 2048;

/// FIP window start within the flash
pub const SF_FIP_BASE: usize = 0;

/// FIP window length
pub const SF_FIP_MAX_SIZE: usize = 8 << 20;

/// Scratch buffer length
pub const SF_DATA_SIZE: usize = 8 << 20;

/// Default program timeout in milliseconds
pub const PROG_TIMEOUT_MS: u32 = 2000;

/// Default sector erase timeout in milliseconds
pub const PAGE_ERASE_TIMEOUT_MS: u32 = 5000;

/// Complete platform configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct PlatformConfig {
    /// SPI controller settings
    pub spi: SpiConfig,
    /// Flash driver settings
    pub flash: FlashConfig,
    /// Block I/O settings
    pub storage: StorageConfig,
}

/// SPI controller settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct SpiConfig {
    /// Physical base address of the AXI SPI register block
    pub base: usize,
    /// Bus clock in Hz
    pub freq_hz: u32,
    /// Chip-select line of the flash
    pub cs: u8,
    /// SPI mode bits (CPHA 0x01, CPOL 0x02, LSB first 0x08)
    pub mode: u8,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            base: 0x0800_0000,
            freq_hz: 37_500_000,
            cs: 0,
            mode: 0,
        }
    }
}

/// Flash driver settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct FlashConfig {
    /// Program timeout in milliseconds
    pub prog_timeout_ms: u32,
    /// Erase timeout in milliseconds
    pub erase_timeout_ms: u32,
    /// Prefer 4 KiB sector erase on parts that support it
    pub use_4k_sectors: bool,
    /// Read command used for raw reads
    pub read_cmd: ReadCommand,
    /// Write command used for page program
    pub write_cmd: WriteCommand,
    /// Dual flash wiring
    pub dual_flash: DualFlash,
    /// How addresses above 16 MiB are reached
    pub addressing: Addressing,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            prog_timeout_ms: PROG_TIMEOUT_MS,
            erase_timeout_ms: PAGE_ERASE_TIMEOUT_MS,
            use_4k_sectors: true,
            read_cmd: ReadCommand::default(),
            write_cmd: WriteCommand::default(),
            dual_flash: DualFlash::default(),
            addressing: Addressing::default(),
        }
    }
}

/// Block I/O settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct StorageConfig {
    /// Alignment for windows and the scratch buffer
    pub page_size: usize,
    /// Scratch buffer location and length
    pub scratch: BlockSpec,
    /// FIP window within the flash
    pub fip: BlockSpec,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: SF_PAGE_SIZE,
            scratch: BlockSpec::new(DDR_BASE, SF_DATA_SIZE),
            fip: BlockSpec::new(SF_FIP_BASE, SF_FIP_MAX_SIZE),
        }
    }
}

#[cfg(feature = "std")]
impl PlatformConfig {
    /// Parse a TOML platform description
    pub fn from_toml_str(s: &str) -> core::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qserver_defaults() {
        let cfg = PlatformConfig::default();
        assert_eq!(cfg.spi.freq_hz, 37_500_000);
        assert_eq!(cfg.storage.page_size, 2048);
        assert_eq!(cfg.storage.scratch, BlockSpec::new(0x4000_0000, 8 << 20));
        assert_eq!(cfg.storage.fip, BlockSpec::new(0, 8 << 20));
        assert_eq!(cfg.flash.prog_timeout_ms, 2000);
        assert_eq!(cfg.flash.erase_timeout_ms, 5000);
        assert_eq!(cfg.flash.read_cmd, ReadCommand::ArrayFast);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_toml_overrides() {
        let cfg = PlatformConfig::from_toml_str(
            r#"
            [spi]
            freq_hz = 1000000

            [flash]
            read_cmd = "array-slow"
            dual_flash = "stacked"

            [storage]
            page_size = 256
            scratch = { offset = 0, length = 4096 }
            "#,
        )
        .unwrap();
        assert_eq!(cfg.spi.freq_hz, 1_000_000);
        assert_eq!(cfg.spi.base, 0x0800_0000);
        assert_eq!(cfg.flash.read_cmd, ReadCommand::ArraySlow);
        assert_eq!(cfg.flash.dual_flash, DualFlash::Stacked);
        assert_eq!(cfg.flash.prog_timeout_ms, 2000);
        assert_eq!(cfg.storage.page_size, 256);
        assert_eq!(cfg.storage.scratch.length, 4096);
        assert_eq!(cfg.storage.fip, BlockSpec::new(0, 8 << 20));
    }
}
