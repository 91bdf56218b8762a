//! Process-wide cache instances.
//!
//! `CacheRegistry` is built once at startup and handed to each service that
//! needs a cache. The instances live for the whole process; expired entries
//! are dropped lazily on read or in bulk by `purge_expired()`. Tests build
//! their own registry for isolation.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use brandmind_types::config::CacheConfig;
use brandmind_types::profile::BrandProfile;
use brandmind_types::retrieval::RetrievalResult;

use super::ttl::BoundedTtlCache;

/// Fingerprint -> embedding vector.
pub type EmbeddingCache = BoundedTtlCache<String, Arc<[f32]>>;

/// Retrieval cache key -> composed result.
pub type QueryCache = BoundedTtlCache<String, RetrievalResult>;

/// Owner id -> brand profile snapshot.
pub type ProfileCache = BoundedTtlCache<Uuid, BrandProfile>;

/// The three shared caches.
///
/// Cloning shares the same underlying caches.
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    embeddings: Arc<EmbeddingCache>,
    queries: Arc<QueryCache>,
    profiles: Arc<ProfileCache>,
}

/// Occupancy snapshot for one cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub name: &'static str,
    pub len: usize,
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl CacheRegistry {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            embeddings: Arc::new(BoundedTtlCache::new(
                "embeddings",
                config.embeddings.capacity,
                config.embeddings.ttl(),
            )),
            queries: Arc::new(BoundedTtlCache::new(
                "queries",
                config.queries.capacity,
                config.queries.ttl(),
            )),
            profiles: Arc::new(BoundedTtlCache::new(
                "profiles",
                config.profiles.capacity,
                config.profiles.ttl(),
            )),
        }
    }

    pub fn embeddings(&self) -> Arc<EmbeddingCache> {
        Arc::clone(&self.embeddings)
    }

    pub fn queries(&self) -> Arc<QueryCache> {
        Arc::clone(&self.queries)
    }

    pub fn profiles(&self) -> Arc<ProfileCache> {
        Arc::clone(&self.profiles)
    }

    /// Drop expired entries from all three caches, returning how many went.
    pub fn purge_expired(&self) -> usize {
        self.embeddings.purge_expired() + self.queries.purge_expired() + self.profiles.purge_expired()
    }

    pub fn stats(&self) -> Vec<CacheStats> {
        vec![
            stats_for(&self.embeddings),
            stats_for(&self.queries),
            stats_for(&self.profiles),
        ]
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

fn stats_for<K, V>(cache: &BoundedTtlCache<K, V>) -> CacheStats
where
    K: Eq + std::hash::Hash + Clone,
    V: Clone,
{
    CacheStats {
        name: cache.name(),
        len: cache.len(),
        capacity: cache.capacity(),
        ttl_secs: cache.default_ttl().as_secs(),
    }
}
