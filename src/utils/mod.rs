//! Small shared helpers.

pub mod hash;
pub mod path;
pub mod plural;

pub use plural::plural_count;
