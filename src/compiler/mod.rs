//! Sprite compiler.
//!
//! One compile pass:
//!
//! ```text
//! TransformStore ──plan──▶ [static job, dynamic job]
//!                              │ assemble (blocking pool, joined)
//!                              ▼
//!                     CompiledSpriteResult ──publish──▶ readers
//!                              │
//!                              ▼ write (clear output, both trees joined)
//!                     {public}/{output}/{static,dynamic}/{mode}/...
//! ```
//!
//! Planning is synchronous and happens under the store lock; everything
//! after works on owned data.

mod report;
mod write;

pub use report::{format_duplicates, log_transform_sizes, print_duplicates, warn_shrinkage};
pub use write::{OptimizedTarget, find_existing_sprites, resolve_optimized_targets, write_outputs};

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::config::{ModeConfig, OutputPaths, SpriteConfig, SpriteMode};
use crate::debug;
use crate::error::Result;
use crate::sprite::{SpriteAssembler, SpriteJob, SpriteOutput, SpriteShape};
use crate::store::TransformStore;
use crate::svg::{Classification, OptimizeOptions};

/// Entry and shape counts of one compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Store entries per bucket, before pruning.
    entries: [usize; 2],
    /// Shapes handed to the assembler per bucket.
    shapes: [usize; 2],
}

impl CompileStats {
    pub fn entries(&self, bucket: Classification) -> usize {
        self.entries[bucket_index(bucket)]
    }

    pub fn shapes(&self, bucket: Classification) -> usize {
        self.shapes[bucket_index(bucket)]
    }
}

/// Output of one compile, shared read-only with every consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSpriteResult {
    /// Compile counter value this result was produced by.
    pub generation: u64,
    pub optimized: bool,
    pub stats: CompileStats,
    buckets: [SpriteOutput; 2],
}

impl CompiledSpriteResult {
    pub fn bucket(&self, bucket: Classification) -> &SpriteOutput {
        &self.buckets[bucket_index(bucket)]
    }

    pub(crate) fn bucket_mut(&mut self, bucket: Classification) -> &mut SpriteOutput {
        &mut self.buckets[bucket_index(bucket)]
    }

    /// Public URL path of a bucket's sprite for `mode`.
    pub fn sprite_url(
        &self,
        paths: &OutputPaths,
        bucket: Classification,
        mode: SpriteMode,
        options: &ModeConfig,
    ) -> Option<String> {
        let data = self.bucket(bucket).data(mode)?;
        let file = paths
            .bucket_dir(bucket)
            .join(options.dest(mode))
            .join(&data.sprite);
        Some(paths.public_url(&file))
    }
}

const fn bucket_index(bucket: Classification) -> usize {
    match bucket {
        Classification::Static => 0,
        Classification::Dynamic => 1,
    }
}

/// The two jobs of a compile pass.
#[derive(Debug, Clone)]
pub struct CompilePlan {
    pub jobs: [SpriteJob; 2],
    pub stats: CompileStats,
}

/// Compile settings derived from the config.
#[derive(Debug, Clone)]
pub struct CompileSettings {
    pub paths: OutputPaths,
    pub modes: Vec<(SpriteMode, ModeConfig)>,
    pub dev: bool,
    pub optimize_shapes: Option<OptimizeOptions>,
}

impl CompileSettings {
    pub fn from_config(config: &SpriteConfig) -> Self {
        Self {
            paths: config.paths(),
            modes: config.sprites.modes(),
            dev: config.dev,
            optimize_shapes: config.shape.optimize.then(|| OptimizeOptions {
                dpi: config.shape.dpi,
            }),
        }
    }

    /// Split the store into the static and dynamic jobs.
    ///
    /// Regular passes take every entry. Shapes aliasing an already planned
    /// id are skipped so duplicates found by the scan appear once.
    ///
    /// Optimized passes take only used entries, resolved to their canonical
    /// entry, and only the first entry of every fingerprint.
    pub fn plan(&self, store: &TransformStore, optimize: bool) -> CompilePlan {
        let mut jobs = Classification::ALL.map(|bucket| SpriteJob {
            bucket,
            modes: self.modes.clone(),
            shapes: Vec::new(),
            dev: self.dev,
            optimize: self.optimize_shapes.clone(),
        });
        let mut stats = CompileStats::default();
        let mut seen: FxHashSet<String> = FxHashSet::default();

        for (path, entry) in store.iter() {
            stats.entries[bucket_index(entry.classification)] += 1;

            let (path, entry) = if optimize {
                if !entry.used {
                    debug!("optimize"; "never used svg: {}", path.display());
                    continue;
                }
                let Some(canonical) = store.resolve(path) else {
                    continue;
                };
                if !seen.insert(canonical.1.fingerprint.clone()) {
                    debug!("optimize"; "duplicated svg [{}]: {}", entry.fingerprint, path.display());
                    continue;
                }
                canonical
            } else {
                if !seen.insert(entry.generated_id.clone()) {
                    continue;
                }
                (path, entry)
            };

            let index = bucket_index(entry.classification);
            stats.shapes[index] += 1;
            jobs[index].shapes.push(SpriteShape {
                path: path.to_path_buf(),
                id: entry.generated_id.clone(),
                content: Arc::clone(&entry.raw_content),
            });
        }

        CompilePlan { jobs, stats }
    }
}

/// Run both jobs of `plan` concurrently on the blocking pool.
pub async fn assemble(
    assembler: Arc<dyn SpriteAssembler>,
    plan: CompilePlan,
    generation: u64,
    optimized: bool,
) -> Result<CompiledSpriteResult> {
    let CompilePlan {
        jobs: [static_job, dynamic_job],
        stats,
    } = plan;

    let spawn = |job: SpriteJob| {
        let assembler = Arc::clone(&assembler);
        tokio::task::spawn_blocking(move || assembler.assemble(&job))
    };
    let (static_output, dynamic_output) = tokio::try_join!(spawn(static_job), spawn(dynamic_job))?;

    Ok(CompiledSpriteResult {
        generation,
        optimized,
        stats,
        buckets: [static_output?, dynamic_output?],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::BuiltinAssembler;
    use std::path::{Path, PathBuf};

    const PLAIN: &str = r#"<svg viewBox="0 0 24 24"><path d="M0 0"/></svg>"#;
    const PLAIN_SPACED: &str = "<svg viewBox=\"0 0 24 24\">\n  <path d=\"M0 0\"/>\n</svg>";
    const OTHER: &str = r#"<svg viewBox="0 0 24 24"><path d="M1 1"/></svg>"#;
    const GRADIENT: &str =
        r#"<svg viewBox="0 0 24 24"><linearGradient id="g"/><rect fill="url(#g)"/></svg>"#;

    fn shape_ids(plan: &CompilePlan, bucket: Classification) -> Vec<String> {
        plan.jobs[bucket_index(bucket)]
            .shapes
            .iter()
            .map(|shape| shape.id.clone())
            .collect()
    }

    fn shape_paths(plan: &CompilePlan, bucket: Classification) -> Vec<PathBuf> {
        plan.jobs[bucket_index(bucket)]
            .shapes
            .iter()
            .map(|shape| shape.path.clone())
            .collect()
    }

    fn settings() -> CompileSettings {
        CompileSettings {
            paths: OutputPaths::new(Path::new("/site"), Path::new("public"), Path::new("svg-sprite")),
            modes: vec![(SpriteMode::Symbol, ModeConfig::default())],
            dev: true,
            optimize_shapes: None,
        }
    }

    fn store(files: &[(&str, &str)]) -> TransformStore {
        let mut store = TransformStore::default();
        store.rebuild(
            files
                .iter()
                .map(|(p, c)| (PathBuf::from(p), c.to_string()))
                .collect(),
        );
        store
    }

    #[test]
    fn test_plan_partitions_buckets() {
        let store = store(&[("/a.svg", PLAIN), ("/g.svg", GRADIENT)]);
        let plan = settings().plan(&store, false);

        assert_eq!(shape_paths(&plan, Classification::Static), vec![PathBuf::from("/a.svg")]);
        assert_eq!(shape_paths(&plan, Classification::Dynamic), vec![PathBuf::from("/g.svg")]);
        assert_eq!(plan.stats.entries(Classification::Static), 1);
        assert_eq!(plan.stats.shapes(Classification::Dynamic), 1);
    }

    #[test]
    fn test_plan_collapses_scanned_duplicates() {
        let store = store(&[("/a.svg", PLAIN), ("/b.svg", PLAIN_SPACED)]);
        let plan = settings().plan(&store, false);

        assert_eq!(plan.stats.entries(Classification::Static), 2);
        assert_eq!(plan.stats.shapes(Classification::Static), 1);
        let ids = shape_ids(&plan, Classification::Static);
        assert!(ids[0].starts_with("a-"));
    }

    #[test]
    fn test_plan_optimized_skips_unused() {
        let mut store = store(&[("/a.svg", PLAIN), ("/b.svg", OTHER)]);
        store.mark_used(Path::new("/a.svg"));

        let plan = settings().plan(&store, true);
        assert_eq!(plan.stats.shapes(Classification::Static), 1);
        assert_eq!(plan.stats.entries(Classification::Static), 2);
        assert_eq!(shape_paths(&plan, Classification::Static), vec![PathBuf::from("/a.svg")]);
    }

    #[test]
    fn test_plan_optimized_dedupes_by_fingerprint() {
        let mut store = store(&[("/a.svg", PLAIN), ("/b.svg", PLAIN_SPACED)]);
        store.mark_used(Path::new("/a.svg"));
        store.mark_used(Path::new("/b.svg"));

        let plan = settings().plan(&store, true);
        assert_eq!(plan.stats.shapes(Classification::Static), 1);
    }

    #[test]
    fn test_plan_optimized_resolves_canonical() {
        let mut store = store(&[("/a.svg", PLAIN), ("/b.svg", PLAIN)]);
        // a watch-mode copy is not aliased by the store itself
        store.upsert(PathBuf::from("/c.svg"), PLAIN, true);
        store.mark_used(Path::new("/c.svg"));

        let plan = settings().plan(&store, true);
        assert_eq!(shape_paths(&plan, Classification::Static), vec![PathBuf::from("/a.svg")]);
    }

    #[test]
    fn test_plan_with_optimize_shapes() {
        let mut config = SpriteConfig::default();
        config.shape.optimize = true;
        config.shape.dpi = 72.0;
        let settings = CompileSettings::from_config(&config);
        assert_eq!(settings.optimize_shapes.map(|o| o.dpi), Some(72.0));
    }

    #[tokio::test]
    async fn test_assemble_both_buckets() {
        let store = store(&[("/a.svg", PLAIN), ("/g.svg", GRADIENT)]);
        let plan = settings().plan(&store, false);
        let result = assemble(Arc::new(BuiltinAssembler), plan, 3, false).await.unwrap();

        assert_eq!(result.generation, 3);
        for bucket in Classification::ALL {
            let data = result.bucket(bucket).data(SpriteMode::Symbol).unwrap();
            assert_eq!(data.shapes.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_sprite_url() {
        let store = store(&[("/a.svg", PLAIN)]);
        let settings = settings();
        let plan = settings.plan(&store, false);
        let result = assemble(Arc::new(BuiltinAssembler), plan, 1, false).await.unwrap();

        let url = result.sprite_url(
            &settings.paths,
            Classification::Static,
            SpriteMode::Symbol,
            &ModeConfig::default(),
        );
        assert_eq!(url.as_deref(), Some("/svg-sprite/static/symbol/sprite.svg"));
    }
}
