use sha2::{Digest, Sha256};

/// One-way hash for identity values. The input is trimmed and lowercased first
/// so formatting differences collapse to the same digest.
pub fn hash_value(value: &str) -> String {
    let normalized = value.trim().to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Hash of a submitter's name pair, stored on every report.
pub fn submitter_hash(first_name: &str, last_name: &str) -> String {
    hash_value(&format!("{}|{}", first_name, last_name))
}
