//! sfboot-sim - Emulated Xilinx AXI SPI controller with a SPI NOR part
//!
//! The emulation sits below the register interface, so the real
//! [`XilinxSpi`] engine and everything stacked on it run unmodified on the
//! host. [`NorChip`] models the part at the byte-stream level and
//! [`XilinxSim`] models the register block driving it.

mod nor;
mod xilinx;

pub use nor::NorChip;
pub use xilinx::{XilinxSim, FIFO_DEPTH};

use sfboot_core::bus::{Delay, XilinxSpi};
use sfboot_core::config::SpiConfig;

/// Host-side simulator errors
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Image is larger than the emulated part
    #[error("image of {image} bytes does not fit a {size} byte flash")]
    ImageTooLarge {
        /// Image length
        image: usize,
        /// Part size
        size: usize,
    },
    /// No table entry with this name
    #[error("unknown flash chip: {0}")]
    UnknownChip(String),
    /// The engine refused the bus configuration
    #[error("bad SPI configuration: {0}")]
    Config(#[from] sfboot_core::Error),
}

/// Delay that only adds up the requested time
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingDelay {
    /// Total microseconds requested
    pub total_us: u64,
    /// Number of delay calls
    pub calls: u64,
}

impl Delay for CountingDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += us as u64;
        self.calls += 1;
    }
}

/// Engine type used on the host
pub type SimSpi = XilinxSpi<XilinxSim, CountingDelay>;

/// Build and initialise an engine over `sim`
pub fn engine(sim: XilinxSim, config: &SpiConfig) -> Result<SimSpi, SimError> {
    let mut spi = XilinxSpi::new(sim, CountingDelay::default(), config)?;
    spi.init();
    Ok(spi)
}
