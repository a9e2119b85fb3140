//! Erase command implementation

use super::{open_flash, save_image};
use crate::cli::ImageArgs;
use indicatif::{ProgressBar, ProgressStyle};
use sfboot_core::config::PlatformConfig;

/// Erase `[offset, offset + length)` one erase unit at a time
pub fn run_erase(
    args: &ImageArgs,
    config: &PlatformConfig,
    offset: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut flash = open_flash(args, config)?;
    let erase_size = flash.geometry()?.erase_size;
    if offset % erase_size != 0 || length % erase_size != 0 {
        return Err(format!(
            "region {:#x}+{:#x} is not aligned to the {:#x} byte erase size",
            offset, length, erase_size
        )
        .into());
    }

    let pb = ProgressBar::new(length as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} Erasing")?
            .progress_chars("#>-"),
    );

    let mut addr = offset;
    while addr < offset + length {
        flash.erase(addr, erase_size as usize)?;
        addr += erase_size;
        pb.set_position((addr - offset) as u64);
    }
    pb.finish_with_message("Erase complete");

    println!("Erased {} bytes starting at 0x{:08X}", length, offset);
    save_image(flash, args)
}
