//! Content glob matching.
//!
//! Patterns are root-relative, `/`-separated globs. A leading `!` negates a
//! pattern. Two evaluation rules exist:
//!
//! - [`ContentMatcher::is_included`]: scan rule, any positive pattern
//!   matches and no negated pattern matches.
//! - [`ContentMatcher::passes_all`]: watch rule, every pattern must pass on
//!   its own (positive ones match, negated ones don't).

use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use super::ConfigError;
use crate::utils::path::to_slash;

#[derive(Debug, Clone)]
struct Pattern {
    negated: bool,
    matcher: GlobMatcher,
}

impl Pattern {
    fn passes(&self, path: &str) -> bool {
        self.matcher.is_match(path) != self.negated
    }
}

/// Compiled include/exclude glob set.
#[derive(Debug, Clone)]
pub struct ContentMatcher {
    patterns: Vec<Pattern>,
}

impl ContentMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                let (negated, glob) = match raw.strip_prefix('!') {
                    Some(rest) => (true, rest),
                    None => (false, raw),
                };
                let matcher = GlobBuilder::new(glob)
                    .literal_separator(true)
                    .build()
                    .map_err(|e| ConfigError::Glob(raw.to_string(), e))?
                    .compile_matcher();
                Ok(Pattern { negated, matcher })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { patterns })
    }

    /// Any positive pattern matches and no negated pattern matches.
    pub fn is_included(&self, relative: &Path) -> bool {
        let path = to_slash(relative);
        let mut included = false;
        for pattern in &self.patterns {
            if pattern.negated {
                if pattern.matcher.is_match(&path) {
                    return false;
                }
            } else if !included && pattern.matcher.is_match(&path) {
                included = true;
            }
        }
        included
    }

    /// Every pattern passes individually.
    pub fn passes_all(&self, relative: &Path) -> bool {
        let path = to_slash(relative);
        self.patterns.iter().all(|pattern| pattern.passes(&path))
    }
}
