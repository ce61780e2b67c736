//! Optional shape normalization using usvg.
//!
//! Enabled with `[shape] optimize = true`. usvg resolves `use` references,
//! inlines styles and drops editor metadata before the shape enters the
//! sprite. Real minification is left to an external optimizer.

use anyhow::{Context, Result};

/// Options for the normalization pass
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// DPI for unit conversion.
    pub dpi: f32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self { dpi: 96.0 }
    }
}

/// Re-serialize `content` through usvg without indentation.
pub fn optimize_svg(content: &str, options: &OptimizeOptions) -> Result<String> {
    let usvg_options = usvg::Options {
        dpi: options.dpi,
        ..Default::default()
    };

    let tree = usvg::Tree::from_str(content, &usvg_options).context("Failed to parse SVG")?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };

    Ok(tree.to_string(&write_options))
}
