//! Incremental update engine.
//!
//! Bundler adapters forward watcher events to the `handle_*` methods:
//!
//! - add/change: debounced per path ([`Debouncer`]), then re-read, upsert
//!   and run a regular compile.
//! - delete: applied immediately, followed by a compile when an entry was
//!   actually removed.
//!
//! The CLI uses [`FsWatcher`], which batches raw notify events itself and
//! applies a whole batch with a single compile ([`SpriteCore::apply_changes`]).
//!
//! Only root-relative paths that pass every content pattern are handled.

mod debouncer;
mod fs;

pub use debouncer::Debouncer;
pub use fs::{ChangeKind, FsWatcher};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compiler::CompiledSpriteResult;
use crate::core::SpriteCore;
use crate::error::{Result, SpriteError};
use crate::store::decode_source;
use crate::svg::Classification;
use crate::utils::path::relative_to;
use crate::{debug, error};

impl SpriteCore {
    /// A file matching the content globs appeared.
    ///
    /// Must be called inside a tokio runtime.
    pub fn handle_file_added(&self, path: &Path) {
        self.schedule_upsert(path);
    }

    /// A watched file changed.
    ///
    /// Must be called inside a tokio runtime.
    pub fn handle_file_changed(&self, path: &Path) {
        self.schedule_upsert(path);
    }

    /// A file was deleted.
    ///
    /// Returns the removed entry's classification, or `None` when the path
    /// is not content or was never stored (no compile runs then).
    pub async fn handle_file_removed(&self, path: &Path) -> Result<Option<Classification>> {
        if !self.is_content(path) {
            return Ok(None);
        }
        self.inner().debouncer.cancel(path);

        let removed = self.inner().store.lock().remove(path);
        if removed.is_some() {
            self.compile(false).await?;
        }
        Ok(removed)
    }

    /// Wait for every scheduled add/change application.
    pub async fn settle(&self) {
        self.inner().debouncer.settle().await;
    }

    /// Re-read `path`, upsert it and compile.
    pub async fn apply_upsert(&self, path: &Path) -> Result<Arc<CompiledSpriteResult>> {
        let content = tokio::fs::read(path)
            .await
            .map(decode_source)
            .map_err(|err| SpriteError::io(path, err))?;
        self.inner()
            .store
            .lock()
            .upsert(path.to_path_buf(), content, true);
        self.compile(false).await
    }

    /// Apply a batch of changes and compile once.
    ///
    /// Returns `None` when nothing in the batch touched the store.
    pub async fn apply_changes(
        &self,
        changes: Vec<(PathBuf, ChangeKind)>,
    ) -> Result<Option<Arc<CompiledSpriteResult>>> {
        let mut upserts = Vec::new();
        let mut dirty = false;

        for (path, kind) in changes {
            if !self.is_content(&path) {
                continue;
            }
            match kind {
                ChangeKind::Removed => {
                    dirty |= self.inner().store.lock().remove(&path).is_some();
                }
                ChangeKind::Created | ChangeKind::Modified => {
                    let content = tokio::fs::read(&path)
                        .await
                        .map(decode_source)
                        .map_err(|err| SpriteError::io(&path, err))?;
                    upserts.push((path, content));
                }
            }
        }

        if !upserts.is_empty() {
            let mut store = self.inner().store.lock();
            for (path, content) in upserts {
                store.upsert(path, content, true);
            }
            dirty = true;
        }

        if !dirty {
            return Ok(None);
        }
        self.compile(false).await.map(Some)
    }

    /// Root-relative path passes every content pattern.
    pub fn is_content(&self, path: &Path) -> bool {
        let relative = relative_to(path, &self.config().root);
        let matched = self.inner().matcher.passes_all(&relative);
        if !matched {
            debug!("watch"; "not content: {}", path.display());
        }
        matched
    }

    fn schedule_upsert(&self, path: &Path) {
        if !self.is_content(path) {
            return;
        }
        let core = self.clone();
        let path = path.to_path_buf();
        self.inner().debouncer.schedule(path.clone(), async move {
            if let Err(err) = core.apply_upsert(&path).await {
                error!("watch"; "{}: {}", path.display(), err);
            }
        });
    }
}
