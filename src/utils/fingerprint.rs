use sha2::{Digest, Sha256};

/// One-way fingerprint of a raw bearer token.
///
/// Sessions are indexed by this value so the raw secret never has to be
/// compared or indexed directly. 64 lowercase hex chars, matching the
/// `token_hash VARCHAR(64)` column.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}
