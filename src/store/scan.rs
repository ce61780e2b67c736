//! Source discovery: walk the root and read every matching SVG.

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rayon::prelude::*;

use crate::config::ContentMatcher;
use crate::error::{Result, SpriteError};

/// Directories never worth descending into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target"];

/// Absolute paths of every `.svg` under `root` selected by `matcher`.
///
/// Sorted walk, so the order is stable between runs.
pub fn collect_svg_files(root: &Path, matcher: &ContentMatcher) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort(true)
        .process_read_dir(|_, _, _, children| {
            children.retain(|entry| {
                entry.as_ref().map_or(true, |e| {
                    !(e.file_type().is_dir()
                        && SKIPPED_DIRS.contains(&e.file_name().to_string_lossy().as_ref()))
                })
            });
        })
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "svg"))
        .filter(|path| {
            path.strip_prefix(root)
                .is_ok_and(|relative| matcher.is_included(relative))
        })
        .collect()
}

/// Read `files` in parallel, preserving order.
///
/// Invalid UTF-8 is replaced with U+FFFD instead of failing the scan.
pub fn read_sources(files: &[PathBuf]) -> Result<Vec<(PathBuf, String)>> {
    files
        .par_iter()
        .map(|path| {
            fs::read(path)
                .map(|bytes| (path.clone(), decode_source(bytes)))
                .map_err(|err| SpriteError::io(path, err))
        })
        .collect()
}

/// Decode file bytes as UTF-8, lossily.
pub fn decode_source(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}
