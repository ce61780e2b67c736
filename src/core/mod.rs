//! The sprite core: one explicitly constructed handle owning the transform
//! store, the latest compiled result and the readiness signal.
//!
//! `SpriteCore` is cheap to clone; every clone shares the same state.
//! Adapters (bundler plugin, CLI, file watcher) hold a clone and call into
//! it. Incremental update handlers live in [`crate::watch`].
//!
//! # Concurrency
//!
//! Store mutations are synchronous and finish under the store lock before
//! any later compile takes its snapshot. Compiles may overlap when events
//! arrive quickly; each one carries a generation number, the newest
//! published result wins, and superseded passes are reported in debug logs.

mod ready;

pub use ready::{READY_MAX_TICKS, READY_TICK};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::compiler::{
    self, CompileSettings, CompiledSpriteResult, find_existing_sprites, print_duplicates,
    resolve_optimized_targets, write_outputs,
};
use crate::config::{ContentMatcher, OutputPaths, SpriteConfig};
use crate::error::{Result, SpriteError};
use crate::logger::{self, LogLevel};
use crate::sprite::{BuiltinAssembler, SpriteAssembler};
use crate::store::{DuplicateMap, TransformEntry, TransformStore, collect_svg_files, read_sources};
use crate::watch::Debouncer;
use crate::{debug, log};

/// Shared handle to the sprite core.
#[derive(Clone)]
pub struct SpriteCore {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) config: SpriteConfig,
    pub(crate) settings: CompileSettings,
    pub(crate) matcher: ContentMatcher,
    pub(crate) store: Mutex<TransformStore>,
    result: ArcSwapOption<CompiledSpriteResult>,
    /// Signalled whenever a result is published.
    ready: Notify,
    assembler: Arc<dyn SpriteAssembler>,
    /// Last handed-out compile number.
    generation: AtomicU64,
    /// Set once the first scan has compiled.
    initialized: AtomicBool,
    pub(crate) debouncer: Debouncer,
}

impl std::fmt::Debug for SpriteCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteCore")
            .field("root", &self.inner.config.root)
            .field("generation", &self.generation())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl SpriteCore {
    /// Create a core with the built-in assembler.
    pub fn initialize(config: SpriteConfig) -> Result<Self> {
        Self::with_assembler(config, BuiltinAssembler)
    }

    /// Create a core with a custom sprite assembler.
    ///
    /// Fails when the config selects no sprite mode or has invalid globs.
    pub fn with_assembler(config: SpriteConfig, assembler: impl SpriteAssembler) -> Result<Self> {
        config.validate()?;
        let matcher = config.content_matcher()?;
        logger::set_level(LogLevel::from_flags(config.debug, config.silent));

        let settings = CompileSettings::from_config(&config);
        let store = TransformStore::new(config.sprites.dynamic_markers().to_vec());
        debug!("core"; "create core for {}", config.root.display());

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                settings,
                matcher,
                store: Mutex::new(store),
                result: ArcSwapOption::empty(),
                ready: Notify::new(),
                assembler: Arc::new(assembler),
                generation: AtomicU64::new(0),
                initialized: AtomicBool::new(false),
                debouncer: Debouncer::new(),
            }),
        })
    }

    pub(crate) fn inner(&self) -> &Inner {
        &self.inner
    }

    pub fn config(&self) -> &SpriteConfig {
        &self.inner.config
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.inner.settings.paths
    }

    /// Rebuild the store from disk. Returns the number of matched files.
    pub async fn scan(&self) -> Result<usize> {
        let root = self.inner.config.root.clone();
        let matcher = self.inner.matcher.clone();
        let sources = tokio::task::spawn_blocking(move || {
            let files = collect_svg_files(&root, &matcher);
            debug!("scan"; "match files: {}", files.len());
            read_sources(&files)
        })
        .await??;

        let count = sources.len();
        self.inner.store.lock().rebuild(sources);
        Ok(count)
    }

    /// Full scan followed by a regular compile.
    pub async fn scan_and_compile(&self) -> Result<Arc<CompiledSpriteResult>> {
        let count = self.scan().await?;
        log!("scan"; "found {}", crate::utils::plural_count(count, "svg"));
        let result = self.compile(false).await?;
        self.inner.initialized.store(true, Ordering::SeqCst);
        Ok(result)
    }

    /// Compile the current store, publish the result and write it to disk.
    ///
    /// `optimize` prunes unused and duplicate shapes and rewrites only the
    /// sprite documents produced by the previous pass.
    pub async fn compile(&self, optimize: bool) -> Result<Arc<CompiledSpriteResult>> {
        let inner = &self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("compile"; "compile #{} start (optimize: {})", generation, optimize);

        let plan = inner.settings.plan(&inner.store.lock(), optimize);
        if optimize {
            compiler::warn_shrinkage(&plan.stats);
        } else {
            compiler::log_transform_sizes(&plan.stats);
        }

        let paths = &inner.settings.paths;
        let existing = if optimize {
            find_existing_sprites(paths)
        } else {
            Vec::new()
        };

        let mut result =
            compiler::assemble(Arc::clone(&inner.assembler), plan, generation, optimize).await?;

        let targets = if optimize {
            let targets = resolve_optimized_targets(paths, &result, &inner.settings.modes, &existing)?;
            for target in &targets {
                let name = target.path.file_name().map(|n| n.to_string_lossy().into_owned());
                if let (Some(data), Some(name)) =
                    (result.bucket_mut(target.bucket).data.get_mut(&target.mode), name)
                {
                    data.sprite = name;
                }
            }
            Some(targets)
        } else {
            None
        };

        let result = Arc::new(result);
        self.publish(Arc::clone(&result));

        write_outputs(paths, &result, targets.as_deref()).await?;

        if !optimize {
            print_duplicates(&inner.store.lock().duplicate_groups());
        }

        let latest = inner.generation.load(Ordering::SeqCst);
        if latest != generation {
            debug!("compile"; "compile #{} superseded by #{}", generation, latest);
        }
        debug!("compile"; "compile #{} end", generation);
        Ok(result)
    }

    /// Publish `result` unless a newer one is already visible, then wake
    /// readiness waiters.
    fn publish(&self, result: Arc<CompiledSpriteResult>) {
        self.inner.result.rcu(|current| match current {
            Some(current) if current.generation > result.generation => Some(Arc::clone(current)),
            _ => Some(Arc::clone(&result)),
        });
        self.inner.ready.notify_waiters();
    }

    /// Latest published result.
    pub fn compiled(&self) -> Option<Arc<CompiledSpriteResult>> {
        self.inner.result.load_full()
    }

    /// Snapshot of the store.
    pub fn store(&self) -> TransformStore {
        self.inner.store.lock().clone()
    }

    /// Run `f` against the store without cloning it.
    pub fn with_store<R>(&self, f: impl FnOnce(&TransformStore) -> R) -> R {
        f(&self.inner.store.lock())
    }

    /// Snapshot of the duplicate map.
    pub fn duplicates(&self) -> DuplicateMap {
        self.inner.store.lock().duplicates().clone()
    }

    /// Flag `path` as used by a consumer.
    pub fn mark_used(&self, path: &Path) -> Result<TransformEntry> {
        self.inner
            .store
            .lock()
            .mark_used(path)
            .cloned()
            .ok_or_else(|| SpriteError::Lookup {
                path: path.to_path_buf(),
            })
    }

    /// Number of compiles started so far.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Whether the first scan has finished compiling.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }
}
