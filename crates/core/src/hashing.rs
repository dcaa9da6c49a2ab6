//! Content fingerprinting for article versions.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Hash article content the way `article_versions.content_hash` stores it.
///
/// Line endings are normalized to `\n` and trailing whitespace is trimmed
/// so that a re-save from a different editor does not count as a change.
pub fn content_hash(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    sha256_hex(normalized.trim_end().as_bytes())
}
