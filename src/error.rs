//! Error types for the sprite core.
//!
//! Warnings (duplicate-content groups, optimization shrinkage) are never
//! errors; they go through the logger.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{ConfigError, SpriteMode};
use crate::svg::Classification;

pub type Result<T, E = SpriteError> = std::result::Result<T, E>;

/// Errors raised by the sprite core and its adapters.
#[derive(Debug, Error)]
pub enum SpriteError {
    /// Invalid configuration, fatal at initialization.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A consumer asked for a path the store never saw.
    ///
    /// Usually means the content globs and the import graph disagree.
    #[error("svg sprite [{}] not found", path.display())]
    Lookup { path: PathBuf },

    /// Optimized write could not find the sprite file from the previous pass.
    #[error("no previously generated {bucket} sprite found for mode `{mode}`")]
    Consistency {
        bucket: Classification,
        mode: SpriteMode,
    },

    /// Readiness gate gave up waiting for the first compile.
    #[error("compile by sprite assembler timeout of {ticks}s")]
    Timeout { ticks: u32 },

    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sprite assembler rejected a job.
    #[error("failed to assemble {bucket} sprite: {message}")]
    Assemble {
        bucket: Classification,
        message: String,
    },

    /// A background compile or write task panicked.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SpriteError {
    /// Wrap an IO error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
