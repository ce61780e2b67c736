//! spriteforge - svg sprite compiler core.
//!
//! Scans a project for svg files, classifies each one as static (safe to
//! reference from an external sprite) or dynamic (needs inline symbols),
//! and assembles stack/symbol sprites for both buckets. Bundler adapters
//! drive the same core through [`plugin::SpritePlugin`]; the CLI drives it
//! directly.
//!
//! ```text
//! scan ──▶ TransformStore ──▶ CompileSettings::plan ──▶ SpriteAssembler ──▶ write
//!              ▲                                                         │
//!   watch ─────┘                              readiness gate ◀── publish ┘
//! ```

pub mod cli;
pub mod compiler;
pub mod config;
pub mod core;
pub mod error;
pub mod logger;
pub mod plugin;
pub mod sprite;
pub mod store;
pub mod svg;
pub mod utils;
pub mod watch;

pub use compiler::CompiledSpriteResult;
pub use config::SpriteConfig;
pub use core::SpriteCore;
pub use error::{Result, SpriteError};
pub use plugin::{Generators, SpritePlugin};
pub use sprite::{BuiltinAssembler, SpriteAssembler};
pub use svg::Classification;
