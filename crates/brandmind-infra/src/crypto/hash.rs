//! SHA-256 fingerprints for embedding cache keys.
//!
//! Implements the `Fingerprinter` trait from `brandmind-core` using the
//! `sha2` crate (RustCrypto ecosystem).

use sha2::{Digest, Sha256};

use brandmind_core::embedding::Fingerprinter;

/// SHA-256 implementation of `Fingerprinter`.
///
/// Digests the full text, so texts that only differ after a long shared
/// prefix never collide in the embedding cache.
pub struct Sha256Fingerprinter;

impl Sha256Fingerprinter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Sha256Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, text: &str) -> String {
        let digest = Sha256::digest(text.as_bytes());
        format!("{:x}", digest)
    }
}
