//! Command-line interface module.

mod args;
pub mod build;
pub mod check;
pub mod watch;

pub use args::{BuildArgs, Cli, Commands};

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Notify;

use crate::config::{SpriteConfig, find_config_file};

/// Locate and load the config file, then apply command-line overrides.
pub fn load_config(cli: &Cli) -> Result<SpriteConfig> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let path = find_config_file(&cli.config, &cwd)
        .with_context(|| format!("config file `{}` not found", cli.config.display()))?;

    let mut config = SpriteConfig::load(&path)?;
    if let Some(args) = cli.command.build_args() {
        apply_build_args(&mut config, args);
    }
    Ok(config)
}

fn apply_build_args(config: &mut SpriteConfig, args: &BuildArgs) {
    config.dev |= args.dev;
    config.debug |= args.verbose;
    config.silent |= args.quiet;
}

/// Install the Ctrl+C handler. The returned signal fires once per press.
pub fn setup_shutdown_handler() -> Result<Arc<Notify>> {
    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    ctrlc::set_handler(move || signal.notify_one())?;
    Ok(shutdown)
}

/// Run the parsed command.
pub async fn run(cli: &Cli, shutdown: Arc<Notify>) -> Result<()> {
    let config = load_config(cli)?;
    match &cli.command {
        Commands::Build { .. } => build::run_build(config).await,
        Commands::Watch { .. } => watch::run_watch(config, shutdown).await,
        Commands::Check { deny_duplicates } => check::run_check(config, *deny_duplicates).await,
    }
}
