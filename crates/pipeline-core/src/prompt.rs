//! Prompt fingerprinting for startup logging.

use sha2::{Digest, Sha256};

/// Stable short fingerprint (first 12 hex chars of SHA-256) for a prompt.
///
/// Logged at startup so deployed prompt versions can be told apart
/// without dumping prompt text into logs.
pub fn hash_prompt(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    digest
        .iter()
        .take(6)
        .map(|b| format!("{:02x}", b))
        .collect()
}
