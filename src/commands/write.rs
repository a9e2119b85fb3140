//! Write command implementation

use super::{open_flash, save_image};
use crate::cli::ImageArgs;
use indicatif::{ProgressBar, ProgressStyle};
use sfboot_core::config::PlatformConfig;
use std::fs;
use std::path::Path;

/// Bytes handed to each program call
const WRITE_CHUNK_SIZE: usize = 4096;

/// Program the contents of `input` at `offset`
///
/// The target range is expected to be erased already; NOR programming only
/// clears bits.
pub fn run_write(
    args: &ImageArgs,
    config: &PlatformConfig,
    offset: u32,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    if data.is_empty() {
        return Err(format!("{:?} is empty", input).into());
    }
    let mut flash = open_flash(args, config)?;

    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} Writing")?
            .progress_chars("#>-"),
    );

    let mut done = 0;
    for chunk in data.chunks(WRITE_CHUNK_SIZE) {
        flash.program(offset + done as u32, chunk)?;
        done += chunk.len();
        pb.set_position(done as u64);
    }
    pb.finish_with_message("Write complete");

    let mut check = vec![0u8; data.len()];
    let n = flash.read(offset, &mut check)?;
    if n != data.len() || check != data {
        return Err("verification failed: flash contents differ from input".into());
    }

    println!("Wrote {} bytes at 0x{:08X}", data.len(), offset);
    save_image(flash, args)
}
