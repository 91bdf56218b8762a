//! Infrastructure layer for Brandmind.
//!
//! Contains implementations of the ports defined in `brandmind-core`:
//! SQLite repositories for profiles, feedback and preferences, a LanceDB
//! content store with vector search, an OpenAI-compatible embedding client,
//! SHA-256 fingerprinting, and configuration loading.

pub mod config;
pub mod crypto;
pub mod embedding;
pub mod sqlite;
pub mod vector;
