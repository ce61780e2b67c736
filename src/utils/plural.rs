//! Pluralization for log messages.

/// Return "s" suffix for plural counts
///
/// - `plural_s(0)` -> `"s"` (0 shapes)
/// - `plural_s(1)` -> `""` (1 shape)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun: `plural_count(3, "shape")` -> `"3 shapes"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{count} {noun}{}", plural_s(count))
}
