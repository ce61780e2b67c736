//! Shape metadata written next to every sprite as `sprite.json`.
//!
//! The same structures are handed to bundler generators, so field names are
//! part of the public output format.

use serde::{Deserialize, Serialize};

use crate::config::SpriteMode;

/// File name of the per-mode metadata document.
pub const DATA_FILE: &str = "sprite.json";

/// Metadata of one assembled sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteData {
    pub mode: SpriteMode,
    /// Sprite file name, e.g. `sprite.1a2b3c4d.svg`.
    pub sprite: String,
    pub shapes: Vec<ShapeData>,
}

impl SpriteData {
    pub fn empty(mode: SpriteMode, sprite: impl Into<String>) -> Self {
        Self {
            mode,
            sprite: sprite.into(),
            shapes: Vec::new(),
        }
    }

    pub fn shape(&self, id: &str) -> Option<&ShapeData> {
        self.shapes.iter().find(|shape| shape.name == id)
    }

    /// Hidden inline `<svg>` holding every symbol, ready for DOM injection.
    ///
    /// Stack sprites cannot be inlined and yield an empty string.
    pub fn dom_string(&self) -> String {
        let symbols: String = self
            .shapes
            .iter()
            .filter_map(|shape| match &shape.layout {
                ShapeLayout::Symbol { svg } => Some(svg.as_str()),
                ShapeLayout::Stack { .. } => None,
            })
            .collect();
        if symbols.is_empty() {
            return String::new();
        }
        format!(r#"<svg width="0" height="0" style="position:absolute">{symbols}</svg>"#)
    }
}

/// One shape inside a sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeData {
    /// Shape id inside the sprite (`{stem}-{fingerprint}`).
    pub name: String,
    /// Source file stem.
    pub base: String,
    pub width: f32,
    pub height: f32,
    pub view_box: String,
    pub first: bool,
    pub last: bool,
    #[serde(flatten)]
    pub layout: ShapeLayout,
}

/// Mode-specific addressing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum ShapeLayout {
    /// `svg` is the `<symbol>` element.
    Symbol { svg: String },
    /// `fragment` is the `#id` that makes the shape visible.
    Stack { fragment: String },
}
