//! EmbeddingModel trait for text-to-vector conversion.
//!
//! Implementations (e.g., an OpenAI-compatible HTTP client) live in
//! brandmind-infra.

use brandmind_types::error::EmbeddingError;

/// Trait for converting a single text into an embedding vector.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait EmbeddingModel: Send + Sync {
    /// Embed one text.
    ///
    /// May fail with a transient service error; callers decide whether to
    /// propagate or degrade.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    /// The model name used for embeddings (e.g., "text-embedding-3-small").
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
