//! Probe command implementation

use super::{format_size, open_flash};
use crate::cli::ImageArgs;
use sfboot_core::chip::manufacturer;
use sfboot_core::config::PlatformConfig;

/// Scan the emulated part and print what the driver derived
pub fn run_probe(
    args: &ImageArgs,
    config: &PlatformConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let flash = open_flash(args, config)?;
    let geometry = flash.geometry()?;
    let info = geometry.info;

    println!("Found flash chip:");
    println!("  Vendor:      {}", manufacturer::name(info.jedec_mfr()));
    println!("  Name:        {}", info.name);
    println!(
        "  Size:        {} bytes ({})",
        geometry.size,
        format_size(geometry.size as u64)
    );
    println!("  ID:          {:02X?}", info.id());
    println!("  Page size:   {}", geometry.page_size);
    println!(
        "  Erase:       {:#04x} / {}",
        geometry.erase_cmd,
        format_size(geometry.erase_size as u64)
    );
    println!(
        "  Read:        {:#04x} ({} dummy)",
        geometry.read_cmd, geometry.dummy_bytes
    );
    println!("  Program:     {:#04x}", geometry.write_cmd);
    println!("  Address:     {} bytes", geometry.addr_width.bytes());
    if let Some(bank) = flash.current_bank() {
        println!("  Bank:        {}", bank);
    }
    Ok(())
}
