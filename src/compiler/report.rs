//! Compile diagnostics: bucket sizes, optimization shrinkage and the
//! duplicate-content report.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::svg::Classification;
use crate::{debug, log, warn};

use super::CompileStats;

/// Log the per-bucket shape counts of a regular compile.
pub fn log_transform_sizes(stats: &CompileStats) {
    for bucket in Classification::ALL {
        log!("compile"; "{} transform size: {}", bucket, stats.shapes(bucket));
    }
}

/// Warn about buckets that shrank in an optimized compile.
pub fn warn_shrinkage(stats: &CompileStats) {
    for bucket in Classification::ALL {
        let (before, after) = (stats.entries(bucket), stats.shapes(bucket));
        if before != after {
            warn!("optimize"; "{} svg sprite size optimized: {} => {}", bucket, before, after);
        }
    }
}

/// Numbered listing of fingerprints shared by several paths.
///
/// ```text
/// 1.1a2b3c4d
///   - /icons/a.svg
///   - /icons/b.svg
/// ```
pub fn format_duplicates(groups: &[(String, Vec<PathBuf>)]) -> String {
    let width = groups.len().to_string().len();
    let mut out = String::new();
    for (i, (fingerprint, paths)) in groups.iter().enumerate() {
        let _ = writeln!(out, "{:0width$}.{fingerprint}", i + 1);
        for path in paths {
            let _ = writeln!(out, "  - {}", path.display());
        }
    }
    out
}

/// Print the duplicate-content report, if there is anything to report.
pub fn print_duplicates(groups: &[(String, Vec<PathBuf>)]) {
    if groups.is_empty() {
        debug!("compile"; "no duplicate svg files");
        return;
    }
    warn!(
        "compile";
        "some svgs share a content hash (after [ \\n\\t] removed):\n{}",
        format_duplicates(groups).trim_end()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duplicates() {
        let groups = vec![(
            "1a2b3c4d".to_string(),
            vec![PathBuf::from("/icons/a.svg"), PathBuf::from("/icons/b.svg")],
        )];
        assert_eq!(
            format_duplicates(&groups),
            "1.1a2b3c4d\n  - /icons/a.svg\n  - /icons/b.svg\n"
        );
    }

    #[test]
    fn test_format_duplicates_pads_index() {
        let groups: Vec<_> = (0..10)
            .map(|i| (format!("{i:08}"), vec![PathBuf::from("/x.svg")]))
            .collect();
        let out = format_duplicates(&groups);
        assert!(out.starts_with("01.00000000\n"));
        assert!(out.contains("10.00000009\n"));
    }
}
