//! CLI command implementations
//!
//! Every command runs the real stack against an emulated part: the flash
//! state machine and the device pool drive the Xilinx SPI engine, whose
//! register accesses land in the simulator. The part is preloaded from the
//! image file and, for commands that modify it, saved back afterwards.

mod erase;
mod fip;
mod list;
mod probe;
mod read;
mod write;

pub use erase::run_erase;
pub use fip::run_fip;
pub use list::list_chips;
pub use probe::run_probe;
pub use read::run_read;
pub use write::run_write;

use crate::cli::ImageArgs;
use sfboot_core::config::PlatformConfig;
use sfboot_core::flash::SpiFlash;
use sfboot_sim::{NorChip, SimSpi, XilinxSim};
use std::fs;

/// Flash driver over the emulated controller
pub type SimFlash = SpiFlash<SimSpi>;

/// Build the emulated part from `args`, then initialise and scan it
pub fn open_flash(
    args: &ImageArgs,
    config: &PlatformConfig,
) -> Result<SimFlash, Box<dyn std::error::Error>> {
    let mut chip = NorChip::by_name(&args.chip)?;
    if args.image.exists() {
        let data = fs::read(&args.image)?;
        chip.load(&data)?;
        log::debug!("loaded {} bytes from {:?}", data.len(), args.image);
    } else {
        log::warn!("{:?} not found, starting from an erased part", args.image);
    }

    let spi = sfboot_sim::engine(XilinxSim::new(chip), &config.spi)?;
    let mut flash = SpiFlash::new(spi, config.flash.clone());
    flash.scan()?;
    Ok(flash)
}

/// Write the part contents back to the image file
pub fn save_image(flash: SimFlash, args: &ImageArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (sim, _) = flash.into_bus().into_parts();
    let data = sim.into_chip().into_data();
    fs::write(&args.image, &data)?;
    println!("Saved {} bytes to {:?}", data.len(), args.image);
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(16 << 20), "16 MiB");
        assert_eq!(format_size(4096), "4 KiB");
        assert_eq!(format_size(12), "12 B");
    }
}
