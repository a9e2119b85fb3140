//! Flash State Machine
//!
//! [`SpiFlash`] owns a [`SpiBus`] and moves from `Uninitialized` through
//! `Scanning` to `Ready` once [`SpiFlash::scan`] has identified the part.
//! Erase, program and raw read are only accepted in `Ready`; each of them
//! applies the dual-flash and bank translation selected by [`FlashConfig`]
//! and waits for completion by polling the status register.

mod geometry;
mod operations;
mod probe;

pub use geometry::{Geometry, BANK_SIZE};

use crate::bus::SpiBus;
use crate::chip::FlashInfo;
use crate::config::FlashConfig;
use crate::error::{Error, Result};
use crate::io::SfOps;
use crate::spi::opcodes;

/// Read command used for array reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum ReadCommand {
    /// Read Data (0x03), no dummy byte
    ArraySlow,
    /// Fast Read (0x0B)
    #[default]
    ArrayFast,
    /// Dual Output Fast Read (0x3B)
    DualOutputFast,
    /// Quad Output Fast Read (0x6B)
    QuadOutputFast,
    /// Dual I/O Fast Read (0xBB)
    DualIoFast,
    /// Quad I/O Fast Read (0xEB)
    QuadIoFast,
}

impl ReadCommand {
    /// Wire opcode
    pub const fn opcode(self) -> u8 {
        match self {
            Self::ArraySlow => opcodes::READ,
            Self::ArrayFast => opcodes::FAST_READ,
            Self::DualOutputFast => opcodes::DOR,
            Self::QuadOutputFast => opcodes::QOR,
            Self::DualIoFast => opcodes::DIOR,
            Self::QuadIoFast => opcodes::QIOR,
        }
    }

    /// Dummy bytes clocked after the address
    ///
    /// Fast commands need `dummy_cycles / 8`; I/O commands clock their dummy
    /// cycles on every line, so quad I/O needs two bytes.
    pub const fn dummy_bytes(self) -> u8 {
        match self {
            Self::QuadIoFast => 2,
            Self::ArraySlow => 0,
            _ => 1,
        }
    }

    /// Whether the quad enable bit must be set first
    pub const fn is_quad(self) -> bool {
        matches!(self, Self::QuadOutputFast | Self::QuadIoFast)
    }
}

/// Program command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum WriteCommand {
    /// Page Program (0x02)
    #[default]
    PageProgram,
    /// Quad Page Program (0x32)
    QuadPageProgram,
}

impl WriteCommand {
    /// Wire opcode
    pub const fn opcode(self) -> u8 {
        match self {
            Self::PageProgram => opcodes::PP,
            Self::QuadPageProgram => opcodes::QPP,
        }
    }

    /// Whether the quad enable bit must be set first
    pub const fn is_quad(self) -> bool {
        matches!(self, Self::QuadPageProgram)
    }
}

/// How two flash dies share the bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum DualFlash {
    /// One die
    #[default]
    Single,
    /// Two dies one after the other; the upper half selects the second die
    Stacked,
    /// Two dies side by side, each holding every other byte
    Parallel,
}

/// How addresses above 16 MiB are reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum Addressing {
    /// Plain 3-byte addresses, the upper bits are dropped
    ThreeByte,
    /// 3-byte addresses plus a bank/extended address register
    #[default]
    BankRegister,
    /// 4-byte address mode entered with EN4B
    FourByte,
}

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashState {
    /// No part identified yet
    Uninitialized,
    /// Identification in progress
    Scanning,
    /// Geometry known, operations accepted
    Ready,
}

/// Callback reporting whether `[offset, offset + len)` is write protected
pub type LockCheck = fn(u32, u32) -> bool;

/// Bank register opcodes and the bank last written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BankRegister {
    pub(crate) read_cmd: u8,
    pub(crate) write_cmd: u8,
    pub(crate) current: u8,
}

/// SPI NOR flash driver
pub struct SpiFlash<B> {
    bus: B,
    config: FlashConfig,
    state: FlashState,
    geometry: Option<Geometry>,
    bank: Option<BankRegister>,
    upper_page: bool,
    lock_check: Option<LockCheck>,
}

impl<B: SpiBus> SpiFlash<B> {
    /// Create an unscanned driver
    pub fn new(bus: B, config: FlashConfig) -> Self {
        Self {
            bus,
            config,
            state: FlashState::Uninitialized,
            geometry: None,
            bank: None,
            upper_page: false,
            lock_check: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> FlashState {
        self.state
    }

    /// Geometry of the scanned part
    pub fn geometry(&self) -> Result<&Geometry> {
        match (self.state, &self.geometry) {
            (FlashState::Ready, Some(g)) => Ok(g),
            _ => Err(Error::NotReady),
        }
    }

    /// Table entry of the scanned part
    pub fn info(&self) -> Option<&'static FlashInfo> {
        self.geometry.as_ref().map(|g| g.info)
    }

    /// Driver configuration
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Install a write-protection check consulted by erase and program
    pub fn set_lock_check(&mut self, check: Option<LockCheck>) {
        self.lock_check = check;
    }

    /// True when the last translated address hit the upper die of a stacked pair
    pub fn upper_page(&self) -> bool {
        self.upper_page
    }

    /// Bank currently selected through the bank register, if one is in use
    pub fn current_bank(&self) -> Option<u8> {
        self.bank.map(|b| b.current)
    }

    /// Borrow the bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give back the bus
    pub fn into_bus(self) -> B {
        self.bus
    }
}

impl<B: SpiBus> SfOps for SpiFlash<B> {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize> {
        SpiFlash::read(self, offset, buf)
    }

    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<usize> {
        self.program(offset, buf)?;
        Ok(buf.len())
    }
}
