//! Sprite assembly.
//!
//! The compiler hands each bucket to a [`SpriteAssembler`] as a
//! [`SpriteJob`]. The assembler returns the documents to write plus the
//! per-mode shape metadata. [`BuiltinAssembler`] covers stack and symbol
//! sprites; tests and embedders can swap in their own engine.

mod builtin;
mod data;

pub use builtin::BuiltinAssembler;
pub use data::{DATA_FILE, ShapeData, ShapeLayout, SpriteData};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ModeConfig, SpriteMode};
use crate::error::Result;
use crate::svg::{Classification, OptimizeOptions};

/// One shape handed to the assembler.
#[derive(Debug, Clone)]
pub struct SpriteShape {
    /// Source path.
    pub path: PathBuf,
    /// Shape id inside the sprite.
    pub id: String,
    pub content: Arc<str>,
}

/// Everything needed to assemble one bucket.
#[derive(Debug, Clone)]
pub struct SpriteJob {
    pub bucket: Classification,
    /// Configured modes, each producing its own sprite.
    pub modes: Vec<(SpriteMode, ModeConfig)>,
    pub shapes: Vec<SpriteShape>,
    pub dev: bool,
    /// Normalize every shape before assembly.
    pub optimize: Option<OptimizeOptions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// The sprite document.
    Sprite,
    /// `sprite.json` metadata.
    Data,
}

/// A generated file.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteResource {
    pub mode: SpriteMode,
    pub kind: ResourceKind,
    /// Path relative to the bucket directory: `{dest}/{file}`.
    pub path: PathBuf,
    pub contents: String,
}

impl SpriteResource {
    /// `.svg` sprite documents are the only resources kept by the
    /// optimized write.
    pub fn is_sprite(&self) -> bool {
        self.kind == ResourceKind::Sprite
            && self.path.extension().is_some_and(|ext| ext == "svg")
    }
}

/// Result of assembling one bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteOutput {
    pub resources: Vec<SpriteResource>,
    pub data: BTreeMap<SpriteMode, SpriteData>,
}

impl SpriteOutput {
    pub fn data(&self, mode: SpriteMode) -> Option<&SpriteData> {
        self.data.get(&mode)
    }
}

/// Sprite assembly engine.
///
/// Called from the blocking pool, once per bucket per compile.
pub trait SpriteAssembler: Send + Sync + 'static {
    fn assemble(&self, job: &SpriteJob) -> Result<SpriteOutput>;
}

impl<T: SpriteAssembler> SpriteAssembler for Arc<T> {
    fn assemble(&self, job: &SpriteJob) -> Result<SpriteOutput> {
        (**self).assemble(job)
    }
}
