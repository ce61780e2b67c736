//! Named module generators.
//!
//! A generator turns item or sprite data into the source text of a virtual
//! module. Hosts register their own under the names referenced by
//! `[sprites.symbol.runtime]`; the defaults emit a plain data module.

use std::fmt;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde_json::Value;

/// Default generator names.
pub const ITEM_GENERATOR: &str = "item";
pub const SPRITE_GENERATOR: &str = "sprite";

/// Input of a generator call.
#[derive(Debug, Clone)]
pub struct GeneratorContext<'a> {
    /// Project root.
    pub cwd: &'a Path,
    /// `{"item": ...}` for items, sprite data for the sprite module.
    pub payload: Value,
}

pub type GeneratorFn = dyn Fn(&GeneratorContext<'_>) -> String + Send + Sync;

/// Generator registry keyed by name.
#[derive(Default)]
pub struct Generators {
    map: FxHashMap<String, Box<GeneratorFn>>,
}

impl fmt::Debug for Generators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.map.keys().collect();
        names.sort();
        f.debug_struct("Generators").field("names", &names).finish()
    }
}

impl Generators {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `item` and `sprite` data-module generators.
    pub fn with_defaults() -> Self {
        let mut generators = Self::new();
        generators
            .register(ITEM_GENERATOR, |ctx| data_module(&ctx.payload["item"]))
            .register(SPRITE_GENERATOR, |ctx| data_module(&ctx.payload));
        generators
    }

    /// Add or replace the generator called `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, generator: F) -> &mut Self
    where
        F: Fn(&GeneratorContext<'_>) -> String + Send + Sync + 'static,
    {
        self.map.insert(name.into(), Box::new(generator));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Run the generator called `name`.
    pub fn render(&self, name: &str, ctx: &GeneratorContext<'_>) -> Option<String> {
        self.map.get(name).map(|generator| generator(ctx))
    }
}

/// `export default <json>`
fn data_module(value: &Value) -> String {
    format!("export default {value}")
}
