//! Sprite configuration management for `spriteforge.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── content    # include/exclude glob matching
//! ├── error      # ConfigError, ConfigDiagnostics
//! ├── sprites    # [sprites] and [shape] sections
//! └── mod.rs     # SpriteConfig (this file)
//! ```
//!
//! # Example
//!
//! ```toml
//! content = ["src/**/*.svg"]
//! public_dir = "public"
//! output_dir = "svg-sprite"
//!
//! [sprites.symbol.runtime]
//! dynamic_svg_nodes = ["mask"]
//! ```

mod content;
mod error;
mod sprites;
mod util;

pub use content::ContentMatcher;
pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use sprites::{
    ModeConfig, ShapeConfig, SpriteMode, SpritesConfig, SymbolConfig, SymbolRuntime,
};
pub use util::find_config_file;

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::svg::Classification;
use crate::utils::path::{normalize_path, to_slash};
use crate::warn;

/// Default config file name.
pub const CONFIG_FILE: &str = "spriteforge.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing spriteforge.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root. Relative values resolve against the config file's
    /// directory; empty means that directory (or cwd without a file).
    pub root: PathBuf,

    /// Root-relative globs selecting source SVGs. `!` negates.
    pub content: Vec<String>,

    /// Public directory, relative to root.
    pub public_dir: PathBuf,

    /// Output directory, relative to `public_dir`.
    pub output_dir: PathBuf,

    /// Verbose logging.
    pub debug: bool,

    /// Only errors are printed. Wins over `debug`.
    pub silent: bool,

    /// Development build: sprite names are not cache-busted and the
    /// optimization pass is skipped at build end.
    pub dev: bool,

    pub shape: ShapeConfig,

    pub sprites: SpritesConfig,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            content: vec!["**/*.svg".to_string()],
            public_dir: PathBuf::from("public"),
            output_dir: PathBuf::from("svg-sprite"),
            debug: false,
            silent: false,
            dev: false,
            shape: ShapeConfig::default(),
            sprites: SpritesConfig::default(),
        }
    }
}

impl SpriteConfig {
    /// Load, finalize and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.config_path = normalize_path(path);
        let base = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.finalize(&base);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        warn!("config"; "unknown fields in {} ignored: {}", display_path, fields.join(", "));
    }

    /// Resolve `root` against `base` and normalize it.
    pub fn finalize(&mut self, base: &Path) {
        let root = if self.root.as_os_str().is_empty() {
            base.to_path_buf()
        } else {
            base.join(&self.root)
        };
        self.root = normalize_path(&root);
    }

    /// Validate configuration, collecting all errors at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.sprites.is_empty() {
            diag.error_with_hint(
                "sprites",
                format!(
                    "pick a sprite mode, supported [{}]",
                    SpriteMode::ALL.map(SpriteMode::as_str).join(", ")
                ),
                "add `[sprites.symbol]` or `sprites.stack = true`",
            );
        }

        if self.content.iter().all(|p| p.starts_with('!')) {
            diag.error("content", "at least one non-negated glob is required");
        }

        if self.output_dir.as_os_str().is_empty() {
            diag.error("output_dir", "must not be empty");
        }

        if let Some(symbol) = &self.sprites.symbol {
            for field in [&symbol.runtime.item_generator, &symbol.runtime.sprite_generator] {
                if field.trim().is_empty() {
                    diag.error("sprites.symbol.runtime", "generator names must not be empty");
                }
            }
        }

        diag.into_result()
    }

    /// Effective content globs: user globs plus output and dependency excludes.
    pub fn content_patterns(&self) -> Vec<String> {
        let output = to_slash(&self.public_dir.join(&self.output_dir));
        let mut patterns = self.content.clone();
        patterns.push(format!("!{output}/**"));
        patterns.push("!**/node_modules/**".to_string());
        patterns
    }

    /// Compile [`Self::content_patterns`].
    pub fn content_matcher(&self) -> Result<ContentMatcher, ConfigError> {
        ContentMatcher::new(&self.content_patterns())
    }

    /// Get path resolver for output locations.
    pub fn paths(&self) -> OutputPaths {
        OutputPaths::new(&self.root, &self.public_dir, &self.output_dir)
    }
}

// ============================================================================
// output paths
// ============================================================================

/// Absolute output locations derived from the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `{root}/{public_dir}`
    pub public: PathBuf,
    /// `{root}/{public_dir}/{output_dir}`
    pub output: PathBuf,
}

impl OutputPaths {
    pub fn new(root: &Path, public_dir: &Path, output_dir: &Path) -> Self {
        let public = root.join(public_dir);
        let output = public.join(output_dir);
        Self { public, output }
    }

    /// `{output}/static` or `{output}/dynamic`
    pub fn bucket_dir(&self, bucket: Classification) -> PathBuf {
        self.output.join(bucket.as_str())
    }

    /// Public URL path of a file under the public directory.
    ///
    /// `{public}/svg-sprite/static/symbol/sprite.svg` -> `/svg-sprite/static/symbol/sprite.svg`
    pub fn public_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.public).unwrap_or(path);
        let slash = to_slash(relative);
        if slash.starts_with('/') {
            slash
        } else {
            format!("/{slash}")
        }
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config from TOML, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SpriteConfig {
    let (parsed, ignored) = SpriteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
