//! sfboot-core - SPI NOR boot storage stack
//!
//! This crate provides everything an early boot stage needs to pull firmware
//! images out of a SPI NOR flash sitting behind a Xilinx AXI SPI shift-register
//! peripheral. It is `no_std`, never allocates, and only busy-polls.
//!
//! The layers, leaf first:
//!
//! - [`bus`] - byte-at-a-time transfer engine with manual chip-select
//! - [`command`] - command/data phase sequencing on top of the engine
//! - [`chip`] - static ID and geometry table
//! - [`flash`] - scan, status polling, erase, program and raw read
//! - [`io`] - unaligned read translation and the device pool consumed by
//!   the image loader
//!
//! # Features
//!
//! - `std` - Enable standard library support, serde and TOML platform
//!   configuration
//!
//! # Example
//!
//! ```ignore
//! use sfboot_core::bus::{Mmio, XilinxSpi};
//! use sfboot_core::flash::SpiFlash;
//!
//! let regs = unsafe { Mmio::new(cfg.spi.base) };
//! let mut bus = XilinxSpi::new(regs, delay, &cfg.spi)?;
//! bus.init();
//! let mut flash = SpiFlash::new(bus, cfg.flash.clone());
//! let geometry = flash.scan()?;
//! log::info!("{} ({} bytes)", geometry.name(), geometry.size);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bus;
pub mod chip;
pub mod command;
pub mod config;
pub mod error;
pub mod fip;
pub mod flash;
pub mod io;
pub mod poll;
pub mod spi;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
