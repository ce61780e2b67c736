//! Path utilities.
//!
//! - [`fs`]: filesystem path normalization and root-relative conversion

pub mod fs;

pub use fs::{normalize_path, relative_to, to_slash};
