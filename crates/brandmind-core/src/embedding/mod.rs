//! Embedding generation.
//!
//! `EmbeddingModel` and `Fingerprinter` are the ports implemented in
//! brandmind-infra; `EmbeddingService` adds the fingerprint-keyed cache.

pub mod fingerprint;
pub mod model;
pub mod service;

pub use fingerprint::Fingerprinter;
pub use model::EmbeddingModel;
pub use service::{BatchEmbeddings, EmbeddingService};
