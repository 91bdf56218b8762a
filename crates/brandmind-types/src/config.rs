//! Configuration types for Brandmind.
//!
//! `BrandmindConfig` represents the top-level `config.toml` that sizes the
//! caches, sets retrieval defaults, and points at the embedding endpoint.
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::retrieval::{DEFAULT_RETRIEVAL_LIMIT, DEFAULT_SIMILARITY_THRESHOLD};

/// Top-level configuration, loaded from `~/.brandmind/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandmindConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Capacity and time-to-live for one cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheLimits {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl CacheLimits {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Sizing for the three process-wide caches.
///
/// Embeddings of identical text never change, so that cache is large and
/// long-lived. Retrieval results go stale as soon as new content is stored,
/// so that cache is small and short-lived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_embedding_cache")]
    pub embeddings: CacheLimits,
    #[serde(default = "default_query_cache")]
    pub queries: CacheLimits,
    #[serde(default = "default_profile_cache")]
    pub profiles: CacheLimits,
}

fn default_embedding_cache() -> CacheLimits {
    CacheLimits {
        capacity: 1000,
        ttl_secs: 24 * 60 * 60,
    }
}

fn default_query_cache() -> CacheLimits {
    CacheLimits {
        capacity: 100,
        ttl_secs: 5 * 60,
    }
}

fn default_profile_cache() -> CacheLimits {
    CacheLimits {
        capacity: 500,
        ttl_secs: 30 * 60,
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            embeddings: default_embedding_cache(),
            queries: default_query_cache(),
            profiles: default_profile_cache(),
        }
    }
}

/// Defaults applied when callers do not specify retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,
}

fn default_limit() -> usize {
    DEFAULT_RETRIEVAL_LIMIT
}

fn default_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_threshold: default_threshold(),
        }
    }
}

/// Content ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Items written concurrently per sub-batch in `store_batch`.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Target chunk length in characters for document ingestion.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_batch_size() -> usize {
    10
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// OpenAI-compatible embedding endpoint settings.
///
/// The API key is never read from this file; it comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            dimension: default_dimension(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
