//! Read command implementation
//!
//! The read goes through the same path the image loader uses: a device pool
//! slot bound to the SPI flash backend, an entity window over the region and
//! page-aligned fetches into the scratch buffer.

use super::open_flash;
use crate::cli::ImageArgs;
use indicatif::{ProgressBar, ProgressStyle};
use sfboot_core::config::PlatformConfig;
use sfboot_core::io::{BlockSpec, DevicePool, IoType, SeekMode, SfDevSpec, SfDevice};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Bytes per pool read
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Smallest page-aligned window holding `[offset, offset + length)`
fn aligned_window(offset: usize, length: usize, page_size: usize) -> BlockSpec {
    let base = offset / page_size * page_size;
    let end = (offset + length).div_ceil(page_size) * page_size;
    BlockSpec::new(base, end - base)
}

/// Read `length` bytes at `offset` into `output`
pub fn run_read(
    args: &ImageArgs,
    config: &PlatformConfig,
    offset: u32,
    length: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if length == 0 {
        return Err("--length must be non-zero".into());
    }

    let mut flash = open_flash(args, config)?;
    let size = flash.geometry()?.size as usize;
    let (offset, length) = (offset as usize, length as usize);
    if offset.checked_add(length).map_or(true, |end| end > size) {
        return Err(format!("region {:#x}+{:#x} exceeds flash size {:#x}", offset, length, size).into());
    }

    let storage = &config.storage;
    let spec = SfDevSpec {
        buffer: storage.scratch,
        page_size: storage.page_size,
    };
    let mut scratch = vec![0u8; storage.scratch.length];
    let mut dev = SfDevice::new(&spec, &mut scratch, &mut flash);

    let mut pool: DevicePool<'_> = DevicePool::new();
    pool.register(IoType::Sf)?;
    let handle = pool.device_open(&mut dev).map_err(|r| r.error)?;
    let window = aligned_window(offset, length, storage.page_size);
    let entity = pool.open(&handle, &window)?;
    pool.seek(&entity, SeekMode::Set, (offset - window.offset) as i64)?;

    let pb = ProgressBar::new(length as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    let mut data = vec![0u8; length];
    let mut done = 0;
    while done < length {
        let chunk = READ_CHUNK_SIZE.min(length - done);
        let n = pool.read(&entity, &mut data[done..done + chunk])?;
        done += n;
        pb.set_position(done as u64);
    }
    pb.finish_with_message("Read complete");

    pool.close(entity)?;
    pool.device_close(handle)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;
    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_window() {
        assert_eq!(aligned_window(0x8123, 5000, 2048), BlockSpec::new(0x8000, 0x1800));
        assert_eq!(aligned_window(0, 2048, 2048), BlockSpec::new(0, 2048));
        assert_eq!(aligned_window(2047, 2, 2048), BlockSpec::new(0, 4096));
    }
}
