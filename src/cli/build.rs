//! `build` command: scan, compile and write every sprite once.

use std::time::Instant;

use anyhow::Result;

use crate::config::SpriteConfig;
use crate::core::SpriteCore;
use crate::log;
use crate::svg::Classification;
use crate::utils::plural_count;

pub async fn run_build(config: SpriteConfig) -> Result<()> {
    let start = Instant::now();
    let core = SpriteCore::initialize(config)?;
    let result = core.scan_and_compile().await?;

    log!(
        "build";
        "{} static, {} dynamic written to {} in {:.2?}",
        plural_count(result.stats.shapes(Classification::Static), "shape"),
        plural_count(result.stats.shapes(Classification::Dynamic), "shape"),
        core.paths().output.display(),
        start.elapsed()
    );
    Ok(())
}
