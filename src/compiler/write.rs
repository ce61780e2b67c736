//! Disk write phase.
//!
//! Every pass clears `{public}/{output}` and rewrites both bucket trees
//! concurrently. An optimized pass writes only the sprite documents, each
//! over the file the previous pass left in the same `{bucket}/{dest}`
//! directory, so URLs already handed out keep resolving.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::config::{ModeConfig, OutputPaths, SpriteMode};
use crate::error::{Result, SpriteError};
use crate::svg::Classification;
use crate::{debug, log};

use super::CompiledSpriteResult;

/// Where an optimized sprite document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedTarget {
    pub bucket: Classification,
    pub mode: SpriteMode,
    pub path: PathBuf,
}

/// `.svg` files currently under the bucket directories.
///
/// Must run before the output directory is cleared.
pub fn find_existing_sprites(paths: &OutputPaths) -> Vec<PathBuf> {
    Classification::ALL
        .iter()
        .flat_map(|bucket| {
            WalkDir::new(paths.bucket_dir(*bucket))
                .sort(true)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "svg"))
        })
        .collect()
}

/// Match every sprite document of `result` with a file from `existing`.
///
/// The match is the first file whose directory is `{bucket}/{dest}`.
pub fn resolve_optimized_targets(
    paths: &OutputPaths,
    result: &CompiledSpriteResult,
    modes: &[(SpriteMode, ModeConfig)],
    existing: &[PathBuf],
) -> Result<Vec<OptimizedTarget>> {
    let mut targets = Vec::new();
    for bucket in Classification::ALL {
        for resource in result.bucket(bucket).resources.iter().filter(|r| r.is_sprite()) {
            let dest = modes
                .iter()
                .find(|(mode, _)| *mode == resource.mode)
                .map(|(mode, options)| options.dest(*mode).to_string())
                .unwrap_or_else(|| resource.mode.as_str().to_string());
            let dir = paths.bucket_dir(bucket).join(dest);

            let path = existing
                .iter()
                .find(|path| path.parent() == Some(dir.as_path()))
                .cloned()
                .ok_or(SpriteError::Consistency {
                    bucket,
                    mode: resource.mode,
                })?;
            targets.push(OptimizedTarget {
                bucket,
                mode: resource.mode,
                path,
            });
        }
    }
    Ok(targets)
}

/// Clear the output directory and write `result`.
///
/// With `optimized` targets only sprite documents are written, to those
/// targets; otherwise every resource goes to `{bucket}/{resource path}`.
pub async fn write_outputs(
    paths: &OutputPaths,
    result: &CompiledSpriteResult,
    optimized: Option<&[OptimizedTarget]>,
) -> Result<()> {
    clear_dir(&paths.output).await?;

    let files = |bucket| bucket_files(paths, result, bucket, optimized);
    let optimized = optimized.is_some();
    tokio::try_join!(
        write_bucket(Classification::Static, files(Classification::Static), optimized),
        write_bucket(Classification::Dynamic, files(Classification::Dynamic), optimized),
    )?;
    Ok(())
}

fn bucket_files<'a>(
    paths: &OutputPaths,
    result: &'a CompiledSpriteResult,
    bucket: Classification,
    optimized: Option<&[OptimizedTarget]>,
) -> Vec<(PathBuf, &'a str)> {
    let output = result.bucket(bucket);
    match optimized {
        Some(targets) => output
            .resources
            .iter()
            .filter(|r| r.is_sprite())
            .filter_map(|r| {
                targets
                    .iter()
                    .find(|t| t.bucket == bucket && t.mode == r.mode)
                    .map(|t| (t.path.clone(), r.contents.as_str()))
            })
            .collect(),
        None => output
            .resources
            .iter()
            .map(|r| (paths.bucket_dir(bucket).join(&r.path), r.contents.as_str()))
            .collect(),
    }
}

async fn write_bucket(
    bucket: Classification,
    files: Vec<(PathBuf, &str)>,
    optimized: bool,
) -> Result<()> {
    for (path, contents) in files {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| SpriteError::io(parent, err))?;
        }
        tokio::fs::write(&path, contents)
            .await
            .map_err(|err| SpriteError::io(&path, err))?;

        if optimized {
            log!("optimize"; "output optimized {} svg sprite: {}", bucket, path.display());
        } else {
            debug!("compile"; "output {} svg sprite: {}", bucket, path.display());
        }
    }
    Ok(())
}

async fn clear_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(SpriteError::io(dir, err)),
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| SpriteError::io(dir, err))
}
