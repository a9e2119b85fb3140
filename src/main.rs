//! sfboot - host front end for the SPI NOR boot storage stack
//!
//! Runs the complete stack (device pool, unaligned read translation, flash
//! state machine, command layer and Xilinx SPI engine) against an emulated
//! register block and flash part backed by an image file.
//!
//! # Architecture
//!
//! - `sfboot-core` - the `no_std` stack as it runs in the boot stage
//! - `sfboot-sim` - register-level emulation of the controller and the part
//! - this binary - argument parsing, configuration loading and progress output

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use sfboot_core::config::PlatformConfig;
use std::path::Path;

fn load_config(path: Option<&Path>) -> Result<PlatformConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let config = PlatformConfig::from_toml_str(&text)?;
            log::info!("Loaded platform configuration from {:?}", path);
            Ok(config)
        }
        None => Ok(PlatformConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load platform configuration: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Probe { image } => commands::run_probe(&image, &config),
        Commands::Read {
            image,
            offset,
            length,
            output,
        } => commands::run_read(&image, &config, offset, length, &output),
        Commands::Erase {
            image,
            offset,
            length,
        } => commands::run_erase(&image, &config, offset, length),
        Commands::Write {
            image,
            offset,
            input,
        } => commands::run_write(&image, &config, offset, &input),
        Commands::Fip { image } => commands::run_fip(&image, &config),
        Commands::ListChips { vendor } => {
            commands::list_chips(vendor.as_deref());
            Ok(())
        }
    }
}
