//! Bundler adapter.
//!
//! Maps the usual bundler hooks onto [`SpriteCore`]:
//!
//! | hook            | behavior                                               |
//! |-----------------|--------------------------------------------------------|
//! | `build_start`   | first call scans and compiles                          |
//! | `resolve_id`    | claims `~svg-sprite/*` ids                             |
//! | `load`          | `~svg-sprite/symbol` → sprite module (dynamic symbols) |
//! | `transform`     | `*.svg` (or `*.svg?symbol`) → per-icon module          |
//! | `build_end`     | production builds run the optimize pass                |
//! | `watch_change`  | forwarded to the incremental engine once initialized   |
//!
//! Module source text comes from the named [`Generators`].

mod generator;

pub use generator::{
    GeneratorContext, GeneratorFn, Generators, ITEM_GENERATOR, SPRITE_GENERATOR,
};

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;

use crate::config::{ConfigDiagnostics, ConfigError, ModeConfig, SpriteMode, SymbolRuntime};
use crate::core::SpriteCore;
use crate::error::{Result, SpriteError};
use crate::sprite::SpriteData;
use crate::svg::Classification;
use crate::utils::path::{normalize_path, relative_to, to_slash};
use crate::{debug, error};

/// Prefix of every virtual module id.
pub const SVG_SPRITE_PREFIX: &str = "~svg-sprite/";

/// Virtual module exporting the dynamic symbol sprite.
pub const SVG_SPRITE_SYMBOL: &str = "~svg-sprite/symbol";

/// Query suffix required when `resource_query` is on.
const SYMBOL_QUERY: &str = "?symbol";

/// Watcher event kinds reported by a bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    Create,
    Update,
    Delete,
}

/// Per-icon data handed to the item generator as `payload.item`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolItem {
    pub id: String,
    #[serde(rename = "type")]
    pub bucket: Classification,
    /// `{static sprite url}#{id}` or `#{id}` for inline dynamic symbols.
    pub href: String,
    /// Root-relative path of the canonical source file.
    pub path: String,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub view_box: Option<String>,
}

/// Sprite-module data handed to the sprite generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSprite {
    /// Public URL of the dynamic symbol sprite.
    pub pathname: Option<String>,
    /// Hidden `<svg>` with every dynamic symbol, for DOM injection.
    pub dom_str: String,
    #[serde(flatten)]
    pub data: Option<SpriteData>,
}

/// Bundler-facing wrapper around a [`SpriteCore`].
#[derive(Debug)]
pub struct SpritePlugin {
    core: SpriteCore,
    generators: Generators,
}

impl SpritePlugin {
    /// Wrap `core`, checking that the configured generators are registered.
    pub fn new(core: SpriteCore, generators: Generators) -> Result<Self> {
        if let Some(runtime) = core.config().sprites.symbol.as_ref().map(|s| &s.runtime) {
            let mut diag = ConfigDiagnostics::new();
            for (field, name) in [
                ("sprites.symbol.item_generator", &runtime.item_generator),
                ("sprites.symbol.sprite_generator", &runtime.sprite_generator),
            ] {
                if !generators.contains(name) {
                    diag.error_with_hint(
                        field,
                        format!("generator `{name}` is not registered"),
                        "register it with `Generators::register` before creating the plugin",
                    );
                }
            }
            diag.into_result()?;
        }
        Ok(Self { core, generators })
    }

    pub fn core(&self) -> &SpriteCore {
        &self.core
    }

    /// Scan and compile on the first call; later calls are no-ops.
    pub async fn build_start(&self) -> Result<()> {
        if self.core.is_initialized() {
            return Ok(());
        }
        self.core.scan_and_compile().await?;
        Ok(())
    }

    /// Claim virtual sprite ids.
    pub fn resolve_id<'a>(&self, id: &'a str) -> Option<&'a str> {
        (self.use_symbol() && id.starts_with(SVG_SPRITE_PREFIX)).then_some(id)
    }

    pub fn load_include(&self, id: &str) -> bool {
        self.use_symbol() && id == SVG_SPRITE_SYMBOL
    }

    /// Source of the `~svg-sprite/symbol` module.
    pub async fn load(&self, id: &str) -> Result<Option<String>> {
        if !self.load_include(id) {
            return Ok(None);
        }
        let result = self.core.wait_until_ready().await?;
        let data = result
            .bucket(Classification::Dynamic)
            .data(SpriteMode::Symbol)
            .cloned();
        let pathname = self.symbol_mode().and_then(|mode| {
            result.sprite_url(self.core.paths(), Classification::Dynamic, SpriteMode::Symbol, mode)
        });
        let sprite = SymbolSprite {
            pathname,
            dom_str: data.as_ref().map(SpriteData::dom_string).unwrap_or_default(),
            data,
        };

        let runtime = self.runtime_or_default();
        self.render(&runtime.sprite_generator, json!(sprite))
            .map(Some)
    }

    /// Whether `id` is an svg import this plugin turns into an item module.
    pub fn transform_include(&self, id: &str) -> bool {
        if !self.use_symbol() {
            return false;
        }
        if self.runtime_or_default().resource_query {
            id.ends_with(".svg?symbol")
        } else {
            id.ends_with(".svg") || id.ends_with(".svg?symbol")
        }
    }

    /// Source of the item module for an svg import.
    ///
    /// Fails with [`SpriteError::Lookup`] when the file is not in the store.
    pub async fn transform(&self, id: &str) -> Result<Option<String>> {
        if !self.transform_include(id) {
            return Ok(None);
        }
        let path = self.import_path(id);
        let result = self.core.wait_until_ready().await?;
        self.core.mark_used(&path)?;

        let (canonical, entry) = self
            .core
            .with_store(|store| {
                store
                    .resolve(&path)
                    .map(|(canonical, entry)| (canonical.to_path_buf(), entry.clone()))
            })
            .ok_or_else(|| SpriteError::Lookup { path: path.clone() })?;
        if canonical != path {
            debug!("plugin"; "{} resolves to {}", path.display(), canonical.display());
        }

        let bucket = entry.classification;
        let id = entry.generated_id;
        let shape = result
            .bucket(bucket)
            .data(SpriteMode::Symbol)
            .and_then(|data| data.shape(&id));
        let href = match bucket {
            Classification::Static => {
                let url = self.symbol_mode().and_then(|mode| {
                    result.sprite_url(self.core.paths(), bucket, SpriteMode::Symbol, mode)
                });
                format!("{}#{id}", url.unwrap_or_default())
            }
            Classification::Dynamic => format!("#{id}"),
        };

        let item = SymbolItem {
            href,
            bucket,
            path: to_slash(&relative_to(&canonical, &self.core.config().root)),
            width: shape.map(|s| s.width),
            height: shape.map(|s| s.height),
            view_box: shape.map(|s| s.view_box.clone()),
            id,
        };
        let runtime = self.runtime_or_default();
        self.render(&runtime.item_generator, json!({ "item": item }))
            .map(Some)
    }

    /// Forward a bundler watcher event. Ignored until the first scan is done.
    pub async fn watch_change(&self, path: &Path, event: WatchEvent) {
        if !self.core.is_initialized() {
            debug!("plugin"; "not initialized, ignoring {}", path.display());
            return;
        }
        match event {
            WatchEvent::Create => self.core.handle_file_added(path),
            WatchEvent::Update => self.core.handle_file_changed(path),
            WatchEvent::Delete => {
                if let Err(err) = self.core.handle_file_removed(path).await {
                    error!("plugin"; "{}: {}", path.display(), err);
                }
            }
        }
    }

    /// Production builds rewrite the sprites with only the used shapes.
    pub async fn build_end(&self, is_dev: bool) -> Result<()> {
        if is_dev {
            return Ok(());
        }
        self.core.settle().await;
        self.core.compile(true).await?;
        Ok(())
    }

    fn use_symbol(&self) -> bool {
        self.core.config().sprites.use_symbol()
    }

    fn symbol_mode(&self) -> Option<&ModeConfig> {
        self.core.config().sprites.symbol.as_ref().map(|s| &s.mode)
    }

    fn runtime_or_default(&self) -> SymbolRuntime {
        self.core
            .config()
            .sprites
            .symbol
            .as_ref()
            .map(|s| s.runtime.clone())
            .unwrap_or_default()
    }

    /// Absolute store key of an import id.
    fn import_path(&self, id: &str) -> PathBuf {
        let file = id.strip_suffix(SYMBOL_QUERY).unwrap_or(id);
        normalize_path(&self.core.config().root.join(file))
    }

    fn render(&self, name: &str, payload: serde_json::Value) -> Result<String> {
        let ctx = GeneratorContext {
            cwd: &self.core.config().root,
            payload,
        };
        self.generators.render(name, &ctx).ok_or_else(|| {
            let mut diag = ConfigDiagnostics::new();
            diag.error("sprites.symbol", format!("generator `{name}` is not registered"));
            SpriteError::Config(ConfigError::Diagnostics(diag))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn plugin(dir: &TempDir) -> (SpritePlugin, Arc<CountingAssembler>) {
        let (core, assembler) = core(dir);
        let plugin = SpritePlugin::new(core, Generators::with_defaults()).unwrap();
        plugin.build_start().await.unwrap();
        (plugin, assembler)
    }

    fn item_json(module: &str) -> serde_json::Value {
        let json = module.strip_prefix("export default ").unwrap();
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_build_start_runs_once() {
        let dir = TempDir::new().unwrap();
        let (plugin, assembler) = plugin(&dir).await;
        plugin.build_start().await.unwrap();
        assert_eq!(assembler.compiles(), 1);
    }

    #[test]
    fn test_unknown_generator_is_fatal() {
        let dir = TempDir::new().unwrap();
        let (core, _) = core(&dir);
        let err = SpritePlugin::new(core, Generators::new()).unwrap_err();
        assert!(matches!(err, SpriteError::Config(_)));
    }

    #[tokio::test]
    async fn test_virtual_ids() {
        let dir = TempDir::new().unwrap();
        let (plugin, _) = plugin(&dir).await;
        assert_eq!(plugin.resolve_id(SVG_SPRITE_SYMBOL), Some(SVG_SPRITE_SYMBOL));
        assert_eq!(plugin.resolve_id("./icon.svg"), None);
        assert!(plugin.load_include(SVG_SPRITE_SYMBOL));
        assert!(plugin.load("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transform_static_item() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "icons/home.svg", PLAIN);
        let (plugin, _) = plugin(&dir).await;

        let id = path.to_string_lossy().into_owned();
        assert!(plugin.transform_include(&id));
        let module = plugin.transform(&id).await.unwrap().unwrap();
        let item = &item_json(&module);

        assert_eq!(item["type"], "static");
        assert_eq!(item["path"], "icons/home.svg");
        assert_eq!(item["viewBox"], "0 0 24 24");
        let generated = item["id"].as_str().unwrap();
        assert!(generated.starts_with("home-"));
        let href = item["href"].as_str().unwrap();
        assert!(href.ends_with(&format!("#{generated}")));
        assert!(href.starts_with("/svg-sprite/static/symbol/"));

        let key = plugin.import_path(&id);
        assert!(plugin.core().store().get(&key).unwrap().used);
    }

    #[tokio::test]
    async fn test_transform_dynamic_item_uses_fragment() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "g.svg", GRADIENT);
        let (plugin, _) = plugin(&dir).await;

        let module = plugin
            .transform(&path.to_string_lossy())
            .await
            .unwrap()
            .unwrap();
        let item = item_json(&module);
        assert_eq!(item["type"], "dynamic");
        assert!(item["href"].as_str().unwrap().starts_with("#g-"));
    }

    #[tokio::test]
    async fn test_transform_duplicate_points_at_canonical() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.svg", PLAIN);
        let copy = write(dir.path(), "b.svg", PLAIN_SPACED);
        let (plugin, _) = plugin(&dir).await;

        let module = plugin
            .transform(&copy.to_string_lossy())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item_json(&module)["path"], "a.svg");
    }

    #[tokio::test]
    async fn test_transform_unknown_path_is_lookup_error() {
        let dir = TempDir::new().unwrap();
        let (plugin, _) = plugin(&dir).await;
        let err = plugin.transform("missing.svg").await.unwrap_err();
        assert!(matches!(err, SpriteError::Lookup { .. }));
    }

    #[tokio::test]
    async fn test_load_sprite_module() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "g.svg", GRADIENT);
        let (plugin, _) = plugin(&dir).await;

        let module = plugin.load(SVG_SPRITE_SYMBOL).await.unwrap().unwrap();
        let sprite = item_json(&module);
        assert!(sprite["domStr"].as_str().unwrap().contains("<symbol"));
        assert!(
            sprite["pathname"]
                .as_str()
                .unwrap()
                .starts_with("/svg-sprite/dynamic/symbol/")
        );
        assert_eq!(sprite["shapes"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resource_query() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        if let Some(symbol) = config.sprites.symbol.as_mut() {
            symbol.runtime.resource_query = true;
        }
        let core = SpriteCore::initialize(config).unwrap();
        let plugin = SpritePlugin::new(core, Generators::with_defaults()).unwrap();

        assert!(!plugin.transform_include("/a.svg"));
        assert!(plugin.transform_include("/a.svg?symbol"));
        assert_eq!(plugin.import_path("/x/a.svg?symbol"), PathBuf::from("/x/a.svg"));
    }

    #[tokio::test]
    async fn test_watch_events_ignored_before_init() {
        let dir = TempDir::new().unwrap();
        let (core, assembler) = core(&dir);
        let plugin = SpritePlugin::new(core, Generators::with_defaults()).unwrap();
        let path = write(dir.path(), "a.svg", PLAIN);

        plugin.watch_change(&path, WatchEvent::Create).await;
        plugin.core().settle().await;
        assert_eq!(assembler.compiles(), 0);
        assert!(plugin.core().store().is_empty());
    }

    #[tokio::test]
    async fn test_build_end_optimizes_in_production() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.svg", PLAIN);
        write(dir.path(), "b.svg", OTHER);
        let (plugin, _) = plugin(&dir).await;

        plugin.build_end(true).await.unwrap();
        assert!(!plugin.core().compiled().unwrap().optimized);

        plugin
            .transform(&dir.path().join("a.svg").to_string_lossy())
            .await
            .unwrap();
        plugin.build_end(false).await.unwrap();
        let result = plugin.core().compiled().unwrap();
        assert!(result.optimized);
        assert_eq!(result.stats.shapes(Classification::Static), 1);
    }
}
