//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "sfboot")]
#[command(author, version, about = "SPI NOR boot storage stack on an emulated Xilinx SPI controller", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Platform configuration file (TOML); defaults to the qserver board
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flash image options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct ImageArgs {
    /// Flash image file backing the emulated part (erased if missing)
    #[arg(short, long)]
    pub image: PathBuf,

    /// Emulated part, by ID table name
    #[arg(short, long, default_value = "mx25l12805")]
    pub chip: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the flash and print its geometry
    Probe {
        #[command(flatten)]
        image: ImageArgs,
    },

    /// Read a region through the device pool
    Read {
        #[command(flatten)]
        image: ImageArgs,

        /// Start offset (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32)]
        offset: u32,

        /// Number of bytes to read (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        length: u32,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Erase a region and save the image
    Erase {
        #[command(flatten)]
        image: ImageArgs,

        /// Start offset, aligned to the erase size (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        offset: u32,

        /// Length, a multiple of the erase size (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        length: u32,
    },

    /// Program a file at an offset and save the image
    Write {
        #[command(flatten)]
        image: ImageArgs,

        /// Start offset (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        offset: u32,

        /// Input file path
        #[arg(long)]
        input: PathBuf,
    },

    /// List the images of the firmware image package
    Fip {
        #[command(flatten)]
        image: ImageArgs,
    },

    /// List the flash ID table
    ListChips {
        /// Filter by vendor name
        #[arg(long)]
        vendor: Option<String>,
    },
}
