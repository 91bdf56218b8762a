//! Embedding model adapters.
//!
//! - `openai`: client for OpenAI-compatible `/embeddings` endpoints

pub mod openai;
mod types;

pub use openai::OpenAiEmbeddingModel;
