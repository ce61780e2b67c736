//! Filesystem watcher for the CLI `watch` command.
//!
//! ```text
//! notify ──std mpsc──▶ bridge thread ──tokio mpsc──▶ EventBatch ──▶ SpriteCore::apply_changes
//! ```
//!
//! The watcher starts before the initial scan so no event is lost; events
//! are buffered and dropped until the core reports it is initialized.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::sync::{Notify, mpsc};

use crate::core::SpriteCore;
use crate::logger;
use crate::utils::path::normalize_path;
use crate::utils::plural_count;
use crate::{debug, log};

/// Quiet period before a batch is applied.
const DEBOUNCE_MS: u64 = 300;

/// Editor temp/backup files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

fn is_svg(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "svg")
}

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Watches the project root and feeds batched changes to the core.
pub struct FsWatcher {
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Kept alive for the lifetime of the watcher.
    _watcher: RecommendedWatcher,
}

impl FsWatcher {
    /// Start watching `root` recursively. Events buffer until [`Self::run`].
    pub fn new(root: &Path) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok(Self {
            notify_rx,
            _watcher: watcher,
        })
    }

    /// Apply batches to `core` until `shutdown` is notified.
    pub async fn run(self, core: SpriteCore, shutdown: Arc<Notify>) {
        let notify_rx = self.notify_rx;
        let _watcher = self._watcher;
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::error!("watch"; "notify error: {}", e),
                }
            }
        });

        let mut batch = EventBatch::default();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.notified() => break,
                Some(event) = async_rx.recv() => batch.add_event(&event),
                _ = tokio::time::sleep(batch.sleep_duration()) => {
                    let Some(changes) = batch.take_if_ready() else {
                        continue;
                    };
                    if !core.is_initialized() {
                        debug!("watch"; "not initialized, dropping {}", plural_count(changes.len(), "event"));
                        continue;
                    }
                    apply(&core, changes).await;
                }
            }
        }
        log!("watch"; "stopped");
    }
}

async fn apply(core: &SpriteCore, changes: Vec<(PathBuf, ChangeKind)>) {
    for (path, kind) in &changes {
        debug!("watch"; "{}: {}", kind.label(), path.display());
    }
    let count = changes.len();
    match core.apply_changes(changes).await {
        Ok(Some(result)) => logger::status_success(&format!(
            "{} changed, sprites compiled (#{})",
            plural_count(count, "svg"),
            result.generation
        )),
        Ok(None) => {}
        Err(err) => logger::status_error("sprite compile failed", &err.to_string()),
    }
}

/// Pending changes, deduplicated per path.
#[derive(Default)]
struct EventBatch {
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
}

impl EventBatch {
    /// Merge a notify event:
    /// - Removed then Created/Modified: Modified (the path existed before
    ///   the batch, so a later Removed must survive)
    /// - Modified then Removed: Removed
    /// - Created then Removed: dropped (never existed outside the batch)
    /// - otherwise the first kind wins
    fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // metadata-only changes (mtime/chmod) never alter content
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) || !is_svg(path) {
                continue;
            }
            let path = normalize_path(path);

            match self.changes.get(&path).copied() {
                None => {
                    self.changes.insert(path, kind);
                }
                Some(ChangeKind::Removed) if kind != ChangeKind::Removed => {
                    self.changes.insert(path, ChangeKind::Modified);
                }
                Some(ChangeKind::Modified) if kind == ChangeKind::Removed => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                Some(ChangeKind::Created) if kind == ChangeKind::Removed => {
                    self.changes.remove(&path);
                }
                Some(_) => continue,
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the batch once the quiet period has passed.
    ///
    /// Kinds are reconciled with the filesystem, since renames and atomic
    /// saves often report stale kinds.
    fn take_if_ready(&mut self) -> Option<Vec<(PathBuf, ChangeKind)>> {
        let last_event = self.last_event?;
        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return None;
        }
        self.last_event = None;

        let changes: Vec<_> = std::mem::take(&mut self.changes)
            .into_iter()
            .map(|(path, kind)| {
                let exists = path.is_file();
                let kind = match kind {
                    ChangeKind::Created | ChangeKind::Modified if !exists => ChangeKind::Removed,
                    ChangeKind::Removed if exists => ChangeKind::Modified,
                    kind => kind,
                };
                (path, kind)
            })
            .collect();
        (!changes.is_empty()).then_some(changes)
    }

    fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        Duration::from_millis(DEBOUNCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}
