//! SimilaritySearch trait for nearest-neighbour lookups over stored content.
//!
//! The SQLite adapter in brandmind-infra scans an owner's stored vectors and
//! scores them by cosine similarity.

use uuid::Uuid;

use brandmind_types::error::SearchError;
use brandmind_types::retrieval::SearchHit;

/// Searches stored embeddings for content similar to a query vector.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait SimilaritySearch: Send + Sync {
    /// Return at most `max_count` hits owned by `owner_id` whose similarity
    /// is at least `threshold`, most similar first.
    fn search(
        &self,
        owner_id: &Uuid,
        query_embedding: &[f32],
        threshold: f32,
        max_count: usize,
    ) -> impl std::future::Future<Output = Result<Vec<SearchHit>, SearchError>> + Send;
}
