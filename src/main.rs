//! spriteforge command-line entry point.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use spriteforge::cli::{self, Cli};

fn main() -> Result<()> {
    // Ctrl+C must be handled before the first (blocking) scan starts
    let shutdown = cli::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cli::run(&cli, shutdown))
}
