//! Fingerprinter trait for deriving cache keys from text.
//!
//! Defined in brandmind-core so the embedding service can key its cache
//! without coupling to a hashing algorithm. The SHA-256 adapter lives in
//! brandmind-infra.

/// Derives a key that identifies a text for cache lookups.
///
/// Implementations must digest the whole text: two distinct texts sharing a
/// long prefix must not share a fingerprint.
pub trait Fingerprinter: Send + Sync {
    /// Compute a fingerprint of the given text.
    fn fingerprint(&self, text: &str) -> String;
}
