//! Memoizing wrapper around an [`EmbeddingModel`].
//!
//! Vectors are cached under `"{model}:{fingerprint}"`, where the fingerprint
//! digests the full text. Identical text is embedded at most once per TTL.

use std::sync::Arc;

use futures_util::future::join_all;

use brandmind_types::error::EmbeddingError;

use crate::cache::registry::EmbeddingCache;

use super::fingerprint::Fingerprinter;
use super::model::EmbeddingModel;

/// Result of a best-effort batch embedding.
///
/// `vectors` always has one entry per input. Inputs that failed to embed are
/// represented by a zero vector and listed in `failed_indices`.
#[derive(Debug, Clone)]
pub struct BatchEmbeddings {
    pub vectors: Vec<Arc<[f32]>>,
    pub failed_indices: Vec<usize>,
}

impl BatchEmbeddings {
    pub fn failures(&self) -> usize {
        self.failed_indices.len()
    }
}

/// Embedding service with a shared fingerprint-keyed cache.
pub struct EmbeddingService<M: EmbeddingModel> {
    model: M,
    fingerprinter: Box<dyn Fingerprinter>,
    cache: Arc<EmbeddingCache>,
}

impl<M: EmbeddingModel> EmbeddingService<M> {
    pub fn new(
        model: M,
        fingerprinter: impl Fingerprinter + 'static,
        cache: Arc<EmbeddingCache>,
    ) -> Self {
        Self {
            model,
            fingerprinter: Box::new(fingerprinter),
            cache,
        }
    }

    /// Access the underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Cache key for a text. The model name is part of the key so that
    /// switching models never serves vectors from the old one.
    pub fn cache_key(&self, text: &str) -> String {
        format!(
            "{}:{}",
            self.model.model_name(),
            self.fingerprinter.fingerprint(text)
        )
    }

    /// Embed one text, serving repeated text from the cache.
    ///
    /// Model failures are propagated and nothing is cached for them.
    #[tracing::instrument(
        name = "embed_text",
        skip(self, text),
        fields(model = self.model.model_name(), text_len = text.len())
    )]
    pub async fn embed(&self, text: &str) -> Result<Arc<[f32]>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("text is empty".to_string()));
        }

        let key = self.cache_key(text);
        if let Some(vector) = self.cache.get(&key) {
            tracing::trace!("embedding cache hit");
            return Ok(vector);
        }

        let vector: Arc<[f32]> = self.model.embed(text).await?.into();
        if vector.is_empty() {
            return Err(EmbeddingError::MalformedResponse(
                "model returned an empty vector".to_string(),
            ));
        }

        self.cache.set(key, Arc::clone(&vector));
        Ok(vector)
    }

    /// Embed many texts concurrently without failing the whole batch.
    pub async fn embed_batch(&self, texts: &[String]) -> BatchEmbeddings {
        let results = join_all(texts.iter().map(|text| self.embed(text))).await;

        let mut vectors = Vec::with_capacity(results.len());
        let mut failed_indices = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(vector) => vectors.push(vector),
                Err(e) => {
                    tracing::warn!(index, error = %e, "batch item failed to embed; using zero vector");
                    failed_indices.push(index);
                    vectors.push(Arc::from(vec![0.0; self.model.dimension()]));
                }
            }
        }

        if !failed_indices.is_empty() {
            tracing::warn!(
                failures = failed_indices.len(),
                total = texts.len(),
                "batch embedding completed with failures"
            );
        }

        BatchEmbeddings {
            vectors,
            failed_indices,
        }
    }
}
