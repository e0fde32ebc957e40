use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Only the leading bytes are hashed. Files that share this prefix but differ
/// later get the same fingerprint.
pub const FINGERPRINT_BYTES: u64 = 64 * 1024;

/// SHA-256 hex of the first 64 KiB of a file, None if it cannot be read.
///
/// Ledgers started by the older MD5-based tool keep their existing rows, so
/// the `file_hash` column can hold both 32-digit MD5 and 64-digit SHA-256
/// values. Compare fingerprints only between rows of the same length.
pub fn content_fingerprint(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut prefix = Vec::with_capacity(FINGERPRINT_BYTES as usize);
    file.take(FINGERPRINT_BYTES).read_to_end(&mut prefix).ok()?;
    Some(hex::encode(Sha256::digest(&prefix)))
}
