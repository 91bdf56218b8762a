//! Semantic retrieval over stored content with result caching.
//!
//! A query is embedded, searched for up to `max(2 * limit, 20)` candidates
//! above the threshold, filtered by content type, ranked by similarity and
//! truncated to `limit`. Successful results are cached per query; concurrent
//! identical queries share one in-flight computation.
//!
//! Retrieval never fails: when embedding or search is unavailable the caller
//! gets an empty result and the failure is logged.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio::time::Instant;

use brandmind_types::retrieval::{RetrievalQuery, RetrievalResult, RetrievedChunk};

use crate::cache::registry::QueryCache;
use crate::embedding::{EmbeddingModel, EmbeddingService};

use super::search::SimilaritySearch;

/// Floor on the number of candidates requested from the search collaborator.
pub const MIN_CANDIDATES: usize = 20;

/// Number of candidates to request for a given result limit.
pub fn candidate_count(limit: usize) -> usize {
    limit.saturating_mul(2).max(MIN_CANDIDATES)
}

type InFlight = DashMap<String, Arc<OnceCell<RetrievalResult>>>;

pub struct RetrievalEngine<M: EmbeddingModel, S: SimilaritySearch> {
    embeddings: Arc<EmbeddingService<M>>,
    search: S,
    cache: Arc<QueryCache>,
    in_flight: InFlight,
}

impl<M: EmbeddingModel, S: SimilaritySearch> RetrievalEngine<M, S> {
    pub fn new(embeddings: Arc<EmbeddingService<M>>, search: S, cache: Arc<QueryCache>) -> Self {
        Self {
            embeddings,
            search,
            cache,
            in_flight: DashMap::new(),
        }
    }

    /// Cache key covering every field that affects the result.
    ///
    /// Debug formatting quotes the text, so no two distinct queries collide.
    pub fn cache_key(query: &RetrievalQuery) -> String {
        format!(
            "{:?}",
            (
                query.owner_id,
                &query.content_types,
                query.limit,
                query.similarity_threshold.to_bits(),
                query.include_metadata,
                &query.text,
            )
        )
    }

    /// Retrieve the most similar stored content for `query`.
    #[tracing::instrument(
        name = "retrieve",
        skip(self, query),
        fields(owner_id = %query.owner_id, limit = query.limit)
    )]
    pub async fn retrieve(&self, query: &RetrievalQuery) -> RetrievalResult {
        let key = Self::cache_key(query);
        if let Some(result) = self.cache.get(&key) {
            tracing::debug!("query cache hit");
            return result;
        }

        // The shard guard must be released before awaiting.
        let cell = Arc::clone(&*self.in_flight.entry(key.clone()).or_default());
        let result = cell
            .get_or_init(|| self.compute(query, &key))
            .await
            .clone();
        self.in_flight
            .remove_if(&key, |_, current| Arc::ptr_eq(current, &cell));

        result
    }

    /// Drop every cached query result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn compute(&self, query: &RetrievalQuery, key: &str) -> RetrievalResult {
        let started = Instant::now();
        let elapsed_ms = || started.elapsed().as_millis() as u64;

        let vector = match self.embeddings.embed(&query.text).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed; returning no context");
                return RetrievalResult::empty(&query.text, elapsed_ms());
            }
        };

        let candidates = match self
            .search
            .search(
                &query.owner_id,
                &vector,
                query.similarity_threshold,
                candidate_count(query.limit),
            )
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "similarity search failed; returning no context");
                return RetrievalResult::empty(&query.text, elapsed_ms());
            }
        };

        let mut matched: Vec<_> = candidates
            .into_iter()
            .filter(|hit| {
                query.content_types.is_empty() || query.content_types.contains(&hit.content_type)
            })
            .collect();
        matched.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        let total_matched = matched.len();
        let chunks: Vec<RetrievedChunk> = matched
            .into_iter()
            .take(query.limit)
            .map(|hit| RetrievedChunk::from_hit(hit, query.include_metadata))
            .collect();

        let result = RetrievalResult {
            chunks,
            total_matched,
            original_query: query.text.clone(),
            elapsed_ms: elapsed_ms(),
        };
        tracing::debug!(
            returned = result.chunks.len(),
            total_matched,
            elapsed_ms = result.elapsed_ms,
            "retrieval complete"
        );

        self.cache.set(key.to_string(), result.clone());
        result
    }
}
