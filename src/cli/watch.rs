//! `watch` command: build once, then rebuild on svg changes until Ctrl+C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Notify;

use crate::config::SpriteConfig;
use crate::core::SpriteCore;
use crate::log;
use crate::watch::FsWatcher;

pub async fn run_watch(config: SpriteConfig, shutdown: Arc<Notify>) -> Result<()> {
    let core = SpriteCore::initialize(config)?;
    let root = core.config().root.clone();

    // watch before scanning so edits made during the first build are seen
    let watcher = FsWatcher::new(&root)
        .with_context(|| format!("failed to watch {}", root.display()))?;
    core.scan_and_compile().await?;

    log!("watch"; "watching {} (press Ctrl+C to stop)", root.display());
    watcher.run(core, shutdown).await;
    Ok(())
}
