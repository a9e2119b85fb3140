//! Man page generator for sfboot
//!
//! Writes `sfboot.1` plus one `sfboot-<subcommand>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;

fn render(cmd: clap::Command, path: &Path) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    fs::write(path, buffer)?;
    println!("  {}", path.display());
    Ok(())
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    println!("Man pages generated:");
    for sub in cmd.get_subcommands() {
        let path = output_dir.join(format!("sfboot-{}.1", sub.get_name()));
        render(sub.clone(), &path)?;
    }
    render(cmd, &output_dir.join("sfboot.1"))?;

    println!("\nTo view a page:");
    println!("  man -l {}", output_dir.join("sfboot.1").display());
    Ok(())
}
