use sha2::{Digest, Sha256};

/// Checksum recorded for a migration script.
///
/// Byte-exact: line endings, trailing whitespace and comments all count, so
/// any edit to an applied script shows up as drift.
pub fn script_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(digest)
}
