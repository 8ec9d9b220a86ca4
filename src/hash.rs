//! Stable path fingerprints used to break name collisions.
//!
//! Uses FNV-1a: fast, stable across platforms and releases, and not
//! cryptographic. A fingerprint only has to tell apart the handful of paths
//! that already collided on their simple name.

use crate::path::NestingPath;

/// Hex digits in a path fingerprint.
pub const FINGERPRINT_LEN: usize = 3;

/// Separates schema and segments in the hashed byte stream (ASCII unit separator).
const SEGMENT_SEPARATOR: u8 = 0x1f;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit hash — simple, fast, const-compatible.
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    fnv1a_64_continue(FNV_OFFSET_BASIS, bytes)
}

const fn fnv1a_64_continue(mut hash: u64, bytes: &[u8]) -> u64 {
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Hash a schema name and every segment of a path.
///
/// The separator keeps `["a_b"]` and `["a", "b"]` apart.
pub fn path_hash(schema: &str, path: &NestingPath) -> u64 {
    let mut hash = fnv1a_64(schema.as_bytes());
    for segment in path.segments() {
        hash = fnv1a_64_continue(hash, &[SEGMENT_SEPARATOR]);
        hash = fnv1a_64_continue(hash, segment.as_bytes());
    }
    hash
}

/// Fixed-width lowercase hex fingerprint of `(schema, path)`.
pub fn fingerprint(schema: &str, path: &NestingPath) -> String {
    let full = path_hash(schema, path);
    // Fold high bits down before truncating
    let mixed = full ^ (full >> 32) ^ (full >> 17);
    let mask = (1u64 << (4 * FINGERPRINT_LEN)) - 1;
    format!("{:0width$x}", mixed & mask, width = FINGERPRINT_LEN)
}
