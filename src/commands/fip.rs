//! FIP command implementation

use super::open_flash;
use crate::cli::ImageArgs;
use sfboot_core::config::PlatformConfig;
use sfboot_core::fip;
use sfboot_core::io::{BlockSpec, DevicePool, EntityReader, IoType, SfDevSpec, SfDevice};

/// Print the table of contents of the FIP window
pub fn run_fip(args: &ImageArgs, config: &PlatformConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut flash = open_flash(args, config)?;
    let size = flash.geometry()?.size as usize;

    let storage = &config.storage;
    // The configured window may be larger than a small part
    let length = storage.fip.length.min(size.saturating_sub(storage.fip.offset));
    let window = BlockSpec::new(storage.fip.offset, length / storage.page_size * storage.page_size);

    let spec = SfDevSpec {
        buffer: storage.scratch,
        page_size: storage.page_size,
    };
    let mut scratch = vec![0u8; storage.scratch.length];
    let mut dev = SfDevice::new(&spec, &mut scratch, &mut flash);
    let mut pool: DevicePool<'_> = DevicePool::new();
    pool.register(IoType::Sf)?;
    let handle = pool.device_open(&mut dev).map_err(|r| r.error)?;
    pool.check(&handle, &window)?;
    let entity = pool.open(&handle, &window)?;

    let entries = {
        let mut reader = EntityReader::new(&mut pool, &entity);
        fip::read_toc(&mut reader, window.length as u64)?
    };
    pool.close(entity)?;

    println!("FIP at {:#x} ({} entries):", window.offset, entries.len());
    println!("{:<10} {:>12} {:>12}  UUID", "Image", "Offset", "Size");
    println!("{}", "-".repeat(72));
    for entry in &entries {
        println!(
            "{:<10} {:>#12x} {:>#12x}  {:02x?}",
            entry.name().unwrap_or("?"),
            entry.offset,
            entry.size,
            entry.uuid
        );
    }
    Ok(())
}
