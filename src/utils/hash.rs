//! Short content hashes using blake3.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let fp = hash::short_hex(b"<svg/>", 8); // -> "a1b2c3d4"
//! ```

/// Hash `data` with blake3 and keep the first `len` hex characters.
///
/// `len` is clamped to the full 64-char digest.
#[inline]
pub fn short_hex<T: AsRef<[u8]> + ?Sized>(data: &T, len: usize) -> String {
    let digest = blake3::hash(data.as_ref());
    let hex = hex::encode(digest.as_bytes());
    hex[..len.min(hex.len())].to_string()
}
