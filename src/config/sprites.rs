//! `[sprites]` and `[shape]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [shape]
//! optimize = false        # run shapes through usvg first
//!
//! [sprites]
//! stack = true            # or a table with the mode options below
//!
//! [sprites.symbol]
//! dest = "symbol"         # sub-directory under static/ and dynamic/
//! sprite = "sprite"       # sprite file stem
//! bust = true             # sprite.<hash>.svg (default: true outside dev)
//!
//! [sprites.symbol.runtime]
//! resource_query = false  # only handle `*.svg?symbol` imports
//! item_generator = "item"
//! sprite_generator = "sprite"
//! dynamic_svg_nodes = ["mask"]
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Supported sprite layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpriteMode {
    /// Every shape is a nested `<svg>` shown through `:target`.
    Stack,
    /// Every shape is a `<symbol>` referenced with `<use>`.
    Symbol,
}

impl SpriteMode {
    pub const ALL: [Self; 2] = [Self::Stack, Self::Symbol];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stack => "stack",
            Self::Symbol => "symbol",
        }
    }
}

impl fmt::Display for SpriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-mode output options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// Sub-directory name, defaults to the mode name.
    pub dest: Option<String>,
    /// Sprite file stem, defaults to `sprite`.
    pub sprite: Option<String>,
    /// Content hash in the sprite file name. Defaults to `!dev`.
    pub bust: Option<bool>,
}

impl ModeConfig {
    pub fn dest(&self, mode: SpriteMode) -> &str {
        self.dest.as_deref().unwrap_or(mode.as_str())
    }

    pub fn sprite_stem(&self) -> &str {
        self.sprite.as_deref().unwrap_or("sprite")
    }

    pub fn bust(&self, dev: bool) -> bool {
        self.bust.unwrap_or(!dev)
    }
}

/// Symbol-mode options consumed by the bundler adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolRuntime {
    /// Only `*.svg?symbol` imports are transformed.
    pub resource_query: bool,
    /// Name of the registered generator for per-icon modules.
    pub item_generator: String,
    /// Name of the registered generator for the sprite module.
    pub sprite_generator: String,
    /// Extra element names that make a shape dynamic.
    pub dynamic_svg_nodes: Vec<String>,
}

impl Default for SymbolRuntime {
    fn default() -> Self {
        Self {
            resource_query: false,
            item_generator: "item".to_string(),
            sprite_generator: "sprite".to_string(),
            dynamic_svg_nodes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    #[serde(flatten)]
    pub mode: ModeConfig,
    pub runtime: SymbolRuntime,
}

/// `[sprites]` section. At least one mode must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpritesConfig {
    #[serde(deserialize_with = "deserialize_mode_toggle")]
    pub stack: Option<ModeConfig>,
    pub symbol: Option<SymbolConfig>,
}

impl SpritesConfig {
    pub fn is_empty(&self) -> bool {
        self.stack.is_none() && self.symbol.is_none()
    }

    pub fn use_symbol(&self) -> bool {
        self.symbol.is_some()
    }

    /// Configured modes in a stable order.
    pub fn modes(&self) -> Vec<(SpriteMode, ModeConfig)> {
        let mut modes = Vec::with_capacity(2);
        if let Some(stack) = &self.stack {
            modes.push((SpriteMode::Stack, stack.clone()));
        }
        if let Some(symbol) = &self.symbol {
            modes.push((SpriteMode::Symbol, symbol.mode.clone()));
        }
        modes
    }

    /// User-supplied dynamic marker elements (symbol runtime only).
    pub fn dynamic_markers(&self) -> &[String] {
        self.symbol
            .as_ref()
            .map_or(&[], |s| s.runtime.dynamic_svg_nodes.as_slice())
    }
}

/// `stack = true | false | { ... }`
fn deserialize_mode_toggle<'de, D>(deserializer: D) -> Result<Option<ModeConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Toggle {
        Flag(bool),
        Config(ModeConfig),
    }

    Ok(match Option::<Toggle>::deserialize(deserializer)? {
        None | Some(Toggle::Flag(false)) => None,
        Some(Toggle::Flag(true)) => Some(ModeConfig::default()),
        Some(Toggle::Config(config)) => Some(config),
    })
}

/// `[shape]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Normalize shapes with usvg before assembly.
    pub optimize: bool,
    /// DPI used by the normalization pass.
    pub dpi: f32,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            optimize: false,
            dpi: 96.0,
        }
    }
}
