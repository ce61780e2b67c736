//! Per-path trailing-edge debouncer.
//!
//! Every scheduled application runs on its own task after a short quiet
//! period ([`DEBOUNCE_MS`]), so bursts of events for the same path coalesce
//! into the last one. A task only starts if it is still the newest one for
//! its path, checked under the table lock, which holds on multi-threaded
//! runtimes too. Running applications always finish.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Quiet period before a scheduled application starts.
pub const DEBOUNCE_MS: u64 = 20;

const PENDING: u8 = 0;
const STARTED: u8 = 1;
const CANCELLED: u8 = 2;

struct Pending {
    generation: u64,
    state: Arc<AtomicU8>,
    handle: JoinHandle<()>,
}

impl Pending {
    /// Cancel if not started yet. Returns `true` if cancelled.
    fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if cancelled {
            self.handle.abort();
        }
        cancelled
    }
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when the task finishes or is dropped.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn enter(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(in_flight))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Scheduled applications keyed by path.
#[derive(Default)]
pub struct Debouncer {
    pending: Arc<Mutex<FxHashMap<PathBuf, Pending>>>,
    next_generation: AtomicU64,
    in_flight: Arc<InFlight>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` for `path`, replacing a not-yet-started one.
    ///
    /// Must be called inside a tokio runtime.
    pub fn schedule<F>(&self, path: PathBuf, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(previous) = pending.get(&path)
            && previous.cancel()
        {
            crate::debug!("watch"; "reschedule: {}", path.display());
        }

        let state = Arc::new(AtomicU8::new(PENDING));
        let guard = InFlightGuard::enter(&self.in_flight);
        let handle = tokio::spawn({
            let state = Arc::clone(&state);
            let table = Arc::clone(&self.pending);
            let path = path.clone();
            async move {
                let _guard = guard;
                tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS)).await;
                {
                    let pending = table.lock();
                    let newest = pending.get(&path).is_some_and(|p| p.generation == generation);
                    if !newest
                        || state
                            .compare_exchange(PENDING, STARTED, Ordering::SeqCst, Ordering::SeqCst)
                            .is_err()
                    {
                        return;
                    }
                }
                task.await;
                let mut table = table.lock();
                if table.get(&path).is_some_and(|p| p.generation == generation) {
                    table.remove(&path);
                }
            }
        });

        pending.insert(
            path,
            Pending {
                generation,
                state,
                handle,
            },
        );
    }

    /// Cancel a not-yet-started application for `path`.
    pub fn cancel(&self, path: &Path) -> bool {
        let mut pending = self.pending.lock();
        let cancelled = pending.get(path).is_some_and(Pending::cancel);
        if cancelled {
            pending.remove(path);
        }
        cancelled
    }

    /// Paths with a scheduled or running application.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Wait until every scheduled application has finished or been
    /// cancelled.
    pub async fn settle(&self) {
        loop {
            let idle = self.in_flight.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();
            if self.in_flight.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_tick_events_coalesce() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));

        for i in 1..=3 {
            let runs = Arc::clone(&runs);
            let last = Arc::clone(&last);
            debouncer.schedule(PathBuf::from("/a.svg"), async move {
                runs.fetch_add(1, Ordering::SeqCst);
                last.store(i, Ordering::SeqCst);
            });
        }
        debouncer.settle().await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
        assert_eq!(debouncer.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_paths_are_independent() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for name in ["/a.svg", "/b.svg"] {
            let runs = Arc::clone(&runs);
            debouncer.schedule(PathBuf::from(name), async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        debouncer.settle().await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        debouncer.schedule(PathBuf::from("/a.svg"), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(debouncer.cancel(Path::new("/a.svg")));
        assert!(!debouncer.cancel(Path::new("/a.svg")));
        debouncer.settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_coalesce_on_multi_thread_runtime() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for round in 1..=30 {
            for _ in 0..2 {
                let runs = Arc::clone(&runs);
                debouncer.schedule(PathBuf::from("/a.svg"), async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                });
            }
            debouncer.settle().await;
            assert_eq!(runs.load(Ordering::SeqCst), round);
        }
    }

    #[tokio::test]
    async fn test_started_task_is_not_cancelled() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        debouncer.schedule(PathBuf::from("/a.svg"), async move {
            tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS * 3)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS * 2)).await;
        assert!(!debouncer.cancel(Path::new("/a.svg")));
        debouncer.settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settle_without_work() {
        Debouncer::new().settle().await;
    }
}
