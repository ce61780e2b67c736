//! Transform store: per-path shape metadata and the duplicate map.
//!
//! # Ordering
//!
//! Entries keep insertion order. After a scan that is the walker's
//! enumeration order, and it decides which of several identical files is
//! the canonical one. Watch-mode additions append at the end.
//!
//! # Duplicates
//!
//! During a scan every path whose fingerprint was already seen gets a copy
//! of the canonical entry, and the duplicate map records
//! `fingerprint -> canonical path`. The map is append-only: it is never
//! repointed when the canonical file is later deleted, so a stale canonical
//! path can outlive its file. Watch-mode upserts never touch it.

mod scan;

pub use scan::{collect_svg_files, decode_source, read_sources};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use serde::Serialize;

use crate::debug;
use crate::svg::{Classification, classify, fingerprint};

/// Compiled metadata for one source SVG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformEntry {
    pub classification: Classification,
    /// Original markup.
    #[serde(skip)]
    pub raw_content: Arc<str>,
    /// Whitespace-insensitive 8-char content hash.
    pub fingerprint: String,
    /// `{file stem}-{fingerprint}`, the shape id inside sprites.
    pub generated_id: String,
    /// Sibling path named `{generated_id}.svg`.
    pub output_path: PathBuf,
    /// Set once a consumer imported this path.
    pub used: bool,
}

impl TransformEntry {
    pub fn new(path: &Path, content: Arc<str>, extra_markers: &[String]) -> Self {
        let fingerprint = fingerprint(&content);
        let classification = classify(&content, extra_markers);
        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        let generated_id = format!("{stem}-{fingerprint}");
        let output_path = path.with_file_name(format!("{generated_id}.svg"));

        Self {
            classification,
            raw_content: content,
            fingerprint,
            generated_id,
            output_path,
            used: false,
        }
    }
}

/// Append-only `fingerprint -> canonical path` map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateMap(FxHashMap<String, PathBuf>);

impl DuplicateMap {
    /// Record `canonical` for `fingerprint` unless one is already recorded.
    ///
    /// Returns `true` if the map changed.
    pub fn record(&mut self, fingerprint: &str, canonical: &Path) -> bool {
        if self.0.contains_key(fingerprint) {
            return false;
        }
        self.0.insert(fingerprint.to_string(), canonical.to_path_buf());
        true
    }

    pub fn get(&self, fingerprint: &str) -> Option<&Path> {
        self.0.get(fingerprint).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

/// In-memory table of every known source SVG, keyed by absolute path.
#[derive(Debug, Clone, Default)]
pub struct TransformStore {
    entries: IndexMap<PathBuf, TransformEntry, FxBuildHasher>,
    duplicates: DuplicateMap,
    /// Extra element names that make a shape dynamic.
    extra_markers: Vec<String>,
}

impl TransformStore {
    pub fn new(extra_markers: Vec<String>) -> Self {
        Self {
            entries: IndexMap::default(),
            duplicates: DuplicateMap::default(),
            extra_markers,
        }
    }

    /// Build or overwrite the entry for `path`.
    ///
    /// Does not touch the duplicate map.
    pub fn upsert(
        &mut self,
        path: PathBuf,
        content: impl Into<Arc<str>>,
        is_watch_event: bool,
    ) -> &TransformEntry {
        let entry = TransformEntry::new(&path, content.into(), &self.extra_markers);
        let origin = if is_watch_event { "watch" } else { "scan" };

        if self.entries.contains_key(&path) {
            debug!("store"; "update {} svg ({}): {}", entry.classification, origin, path.display());
        } else {
            debug!("store"; "add {} svg ({}): {}", entry.classification, origin, path.display());
        }

        let (index, _) = self.entries.insert_full(path, entry);
        &self.entries[index]
    }

    /// Delete the entry for `path`, returning its classification.
    ///
    /// `None` when the path was never added or is already gone.
    pub fn remove(&mut self, path: &Path) -> Option<Classification> {
        let entry = self.entries.shift_remove(path)?;
        debug!("store"; "delete {} svg: {}", entry.classification, path.display());
        Some(entry.classification)
    }

    /// Replace the whole table with `sources`, in the given order.
    ///
    /// Later paths whose fingerprint was already seen alias the earlier
    /// (canonical) entry and the duplicate map records the canonical path.
    pub fn rebuild(&mut self, sources: Vec<(PathBuf, String)>) {
        let mut table = Self {
            entries: IndexMap::with_capacity_and_hasher(sources.len(), FxBuildHasher),
            duplicates: DuplicateMap::default(),
            extra_markers: std::mem::take(&mut self.extra_markers),
        };
        for (path, content) in sources {
            table.upsert(path, content, false);
        }

        let mut seen: FxHashMap<String, PathBuf> = FxHashMap::default();
        let mut aliases = Vec::new();
        for (path, entry) in &table.entries {
            match seen.get(&entry.fingerprint) {
                Some(canonical) => aliases.push((path.clone(), canonical.clone())),
                None => {
                    seen.insert(entry.fingerprint.clone(), path.clone());
                }
            }
        }

        for (path, canonical) in aliases {
            let origin = table.entries[&canonical].clone();
            if self.duplicates.record(&origin.fingerprint, &canonical) {
                debug!("store"; "duplicate svg [{}]: {} -> {}", origin.fingerprint, path.display(), canonical.display());
            }
            table.entries.insert(path, origin);
        }

        self.entries = table.entries;
        self.extra_markers = table.extra_markers;
    }

    pub fn get(&self, path: &Path) -> Option<&TransformEntry> {
        self.entries.get(path)
    }

    /// Flag `path` as used and return the updated entry.
    pub fn mark_used(&mut self, path: &Path) -> Option<&TransformEntry> {
        let entry = self.entries.get_mut(path)?;
        entry.used = true;
        Some(entry)
    }

    /// Canonical path whose compiled data `path` should read.
    ///
    /// The duplicate map wins while its canonical path is still stored;
    /// otherwise the path is its own canonical.
    pub fn canonical_path<'a>(&'a self, path: &'a Path) -> Option<&'a Path> {
        self.resolve(path).map(|(canonical, _)| canonical)
    }

    /// Canonical path and entry for `path`. See [`Self::canonical_path`].
    pub fn resolve<'a>(&'a self, path: &'a Path) -> Option<(&'a Path, &'a TransformEntry)> {
        let entry = self.entries.get(path)?;
        let canonical = self
            .duplicates
            .get(&entry.fingerprint)
            .and_then(|canonical| self.entries.get_key_value(canonical))
            .map(|(p, e)| (p.as_path(), e));
        Some(canonical.unwrap_or((path, entry)))
    }

    pub fn duplicates(&self) -> &DuplicateMap {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &TransformEntry)> {
        self.entries.iter().map(|(p, e)| (p.as_path(), e))
    }

    /// Number of entries per classification: `(static, dynamic)`.
    pub fn counts(&self) -> (usize, usize) {
        self.entries
            .values()
            .fold((0, 0), |(s, d), entry| match entry.classification {
                Classification::Static => (s + 1, d),
                Classification::Dynamic => (s, d + 1),
            })
    }

    /// Fingerprints shared by more than one path, in first-seen order.
    pub fn duplicate_groups(&self) -> Vec<(String, Vec<PathBuf>)> {
        let mut groups: IndexMap<&str, Vec<PathBuf>, FxBuildHasher> = IndexMap::default();
        for (path, entry) in &self.entries {
            groups
                .entry(entry.fingerprint.as_str())
                .or_default()
                .push(path.clone());
        }
        groups
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(fp, paths)| (fp.to_string(), paths))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"<svg><path d="M0 0"/></svg>"#;
    const PLAIN_SPACED: &str = "<svg>\n  <path d=\"M0 0\"/>\n</svg>\n";
    const GRADIENT: &str = r#"<svg><linearGradient id="g"/><rect fill="url(#g)"/></svg>"#;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_entry_ids() {
        let entry = TransformEntry::new(Path::new("/icons/home.svg"), PLAIN.into(), &[]);
        assert_eq!(entry.generated_id, format!("home-{}", entry.fingerprint));
        assert_eq!(
            entry.output_path,
            PathBuf::from(format!("/icons/home-{}.svg", entry.fingerprint))
        );
        assert!(!entry.used);
        assert_eq!(entry.classification, Classification::Static);
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut store = TransformStore::default();
        store.upsert(p("/a.svg"), PLAIN, false);
        assert_eq!(store.get(Path::new("/a.svg")).unwrap().classification, Classification::Static);

        store.upsert(p("/a.svg"), GRADIENT, true);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(Path::new("/a.svg")).unwrap().classification, Classification::Dynamic);
        assert!(store.duplicates().is_empty());
    }

    #[test]
    fn test_upsert_uses_extra_markers() {
        let mut store = TransformStore::new(vec!["mask".to_string()]);
        let entry = store.upsert(p("/m.svg"), r#"<svg><mask id="m"/></svg>"#, false);
        assert_eq!(entry.classification, Classification::Dynamic);
    }

    #[test]
    fn test_remove() {
        let mut store = TransformStore::default();
        assert_eq!(store.remove(Path::new("/never.svg")), None);

        store.upsert(p("/g.svg"), GRADIENT, false);
        assert_eq!(store.remove(Path::new("/g.svg")), Some(Classification::Dynamic));
        assert_eq!(store.remove(Path::new("/g.svg")), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_rebuild_aliases_duplicates() {
        let mut store = TransformStore::default();
        store.rebuild(vec![
            (p("/a.svg"), PLAIN.to_string()),
            (p("/b.svg"), PLAIN_SPACED.to_string()),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.duplicates().len(), 1);

        let a = store.get(Path::new("/a.svg")).unwrap().clone();
        let b = store.get(Path::new("/b.svg")).unwrap();
        assert_eq!(&a, b);
        assert_eq!(store.duplicates().get(&a.fingerprint), Some(Path::new("/a.svg")));
        assert_eq!(
            store.canonical_path(Path::new("/b.svg")),
            Some(Path::new("/a.svg"))
        );
    }

    #[test]
    fn test_rebuild_first_enumerated_is_canonical() {
        let mut store = TransformStore::default();
        store.rebuild(vec![
            (p("/z.svg"), PLAIN.to_string()),
            (p("/a.svg"), PLAIN.to_string()),
        ]);
        let fp = &store.get(Path::new("/a.svg")).unwrap().fingerprint;
        assert_eq!(store.duplicates().get(fp), Some(Path::new("/z.svg")));
    }

    #[test]
    fn test_duplicate_map_is_append_only() {
        let mut store = TransformStore::default();
        store.rebuild(vec![
            (p("/a.svg"), PLAIN.to_string()),
            (p("/b.svg"), PLAIN.to_string()),
        ]);
        store.remove(Path::new("/a.svg"));
        store.rebuild(vec![
            (p("/b.svg"), PLAIN.to_string()),
            (p("/c.svg"), PLAIN.to_string()),
        ]);

        // stale canonical survives: known gap
        let fp = store.get(Path::new("/b.svg")).unwrap().fingerprint.clone();
        assert_eq!(store.duplicates().get(&fp), Some(Path::new("/a.svg")));
        assert_eq!(store.duplicates().len(), 1);

        // lookups fall back to the path itself
        assert_eq!(store.canonical_path(Path::new("/c.svg")), Some(Path::new("/c.svg")));
    }

    #[test]
    fn test_mark_used() {
        let mut store = TransformStore::default();
        store.upsert(p("/a.svg"), PLAIN, false);
        assert!(store.mark_used(Path::new("/a.svg")).unwrap().used);
        assert!(store.mark_used(Path::new("/missing.svg")).is_none());
    }

    #[test]
    fn test_canonical_path_without_duplicates() {
        let mut store = TransformStore::default();
        store.upsert(p("/a.svg"), PLAIN, false);
        assert_eq!(store.canonical_path(Path::new("/a.svg")), Some(Path::new("/a.svg")));
        assert_eq!(store.canonical_path(Path::new("/x.svg")), None);
    }

    #[test]
    fn test_counts_and_groups() {
        let mut store = TransformStore::default();
        store.upsert(p("/a.svg"), PLAIN, false);
        store.upsert(p("/b.svg"), PLAIN_SPACED, false);
        store.upsert(p("/g.svg"), GRADIENT, false);

        assert_eq!(store.counts(), (2, 1));

        let groups = store.duplicate_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].1, vec![p("/a.svg"), p("/b.svg")]);
    }

    #[test]
    fn test_removal_keeps_order() {
        let mut store = TransformStore::default();
        for name in ["/1.svg", "/2.svg", "/3.svg"] {
            store.upsert(p(name), format!("<svg id=\"{name}\"/>"), false);
        }
        store.remove(Path::new("/2.svg"));
        let order: Vec<_> = store.iter().map(|(p, _)| p.to_path_buf()).collect();
        assert_eq!(order, vec![p("/1.svg"), p("/3.svg")]);
    }
}
