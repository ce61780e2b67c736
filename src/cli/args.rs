//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// SVG sprite compiler
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: spriteforge.toml)
    #[arg(short = 'C', long, default_value = "spriteforge.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scan the project and write all sprites once
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, then rebuild on every svg change
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Scan the project and report classification and duplicates without writing
    #[command(visible_alias = "c")]
    Check {
        /// Exit with an error when duplicate shapes are found
        #[arg(long)]
        deny_duplicates: bool,
    },
}

impl Commands {
    pub fn build_args(&self) -> Option<&BuildArgs> {
        match self {
            Self::Build { build_args } | Self::Watch { build_args } => Some(build_args),
            Self::Check { .. } => None,
        }
    }
}

/// Arguments shared by `build` and `watch`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Development output: no cache-busting file names
    #[arg(long)]
    pub dev: bool,

    /// Print debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["spriteforge", "build", "--dev", "-v"]);
        assert_eq!(cli.config, PathBuf::from("spriteforge.toml"));
        let args = cli.command.build_args().unwrap();
        assert!(args.dev);
        assert!(args.verbose);
    }

    #[test]
    fn test_parse_alias_and_config() {
        let cli = Cli::parse_from(["spriteforge", "-C", "site/sprites.toml", "w"]);
        assert!(matches!(cli.command, Commands::Watch { .. }));
        assert_eq!(cli.config, PathBuf::from("site/sprites.toml"));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["spriteforge", "build", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_check_has_no_build_args() {
        let cli = Cli::parse_from(["spriteforge", "check", "--deny-duplicates"]);
        assert!(cli.command.build_args().is_none());
    }
}
