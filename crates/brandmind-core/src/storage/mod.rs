//! Content storage for Brandmind.
//!
//! The chunker splits long text, `ContentStore` embeds and persists it
//! through an `EmbeddingRepository` implemented in brandmind-infra.

pub mod chunker;
pub mod content_store;
pub mod repository;

pub use chunker::{chunk_spans, chunk_text};
pub use content_store::ContentStore;
pub use repository::EmbeddingRepository;
