//! Cryptographic helpers for Brandmind.
//!
//! - `hash`: SHA-256 fingerprints used as embedding cache keys

pub mod hash;
