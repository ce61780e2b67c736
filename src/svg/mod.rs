//! SVG fingerprinting and classification.
//!
//! # Modules
//!
//! - [`shape`]: root element geometry + inner markup extraction (quick-xml)
//! - [`optimize`]: optional usvg normalization pass applied to shapes
//!
//! # Fingerprints
//!
//! The fingerprint is the first 8 hex chars of a blake3 digest over the
//! markup with every space, `\n` and `\t` removed, so the same icon saved
//! with different formatting collapses to one fingerprint. 8 hex chars is a
//! 32-bit space; collisions are possible and are treated like duplicates.

mod optimize;
mod shape;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::hash::short_hex;

pub use optimize::{OptimizeOptions, optimize_svg};
pub use shape::{ShapeGeometry, parse_shape};

/// Length of a content fingerprint in hex chars.
pub const FINGERPRINT_LEN: usize = 8;

/// Elements whose rendering depends on id references.
///
/// Shapes containing any of these cannot be flattened into a positional
/// sprite and are compiled into the dynamic sprite instead.
pub const DYNAMIC_MARKERS: [&str; 4] = ["linearGradient", "radialGradient", "filter", "clipPath"];

/// Static/dynamic split of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Plain geometry, safe to lay out by position or reuse as a symbol.
    Static,
    /// Contains gradients, filters or clip paths referenced by id.
    Dynamic,
}

impl Classification {
    pub const ALL: [Self; 2] = [Self::Static, Self::Dynamic];

    /// Directory name of this bucket under the output directory.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whitespace-insensitive 8-char content fingerprint.
pub fn fingerprint(content: &str) -> String {
    let stripped: String = content
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '\t'))
        .collect();
    short_hex(&stripped, FINGERPRINT_LEN)
}

/// Classify markup as static or dynamic.
///
/// A shape is dynamic when it opens any element of [`DYNAMIC_MARKERS`] or of
/// `extra_markers` (a plain `<name` substring test).
pub fn classify<S: AsRef<str>>(content: &str, extra_markers: &[S]) -> Classification {
    let is_dynamic = DYNAMIC_MARKERS
        .iter()
        .copied()
        .chain(extra_markers.iter().map(AsRef::as_ref))
        .filter(|marker| !marker.is_empty())
        .any(|marker| contains_open_tag(content, marker));

    if is_dynamic {
        Classification::Dynamic
    } else {
        Classification::Static
    }
}

#[inline]
fn contains_open_tag(content: &str, name: &str) -> bool {
    content
        .match_indices('<')
        .any(|(i, _)| content[i + 1..].starts_with(name))
}
