//! EmbeddingRepository trait for persisting embedded content.
//!
//! The LanceDB implementation lives in brandmind-infra.

use uuid::Uuid;

use brandmind_types::content::{ContentType, StoredEmbedding};
use brandmind_types::error::RepositoryError;

/// Persistent storage for embedded content rows.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait EmbeddingRepository: Send + Sync {
    /// Insert a new row.
    fn insert(
        &self,
        row: &StoredEmbedding,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the rows derived from the given domain record, except `keep`.
    ///
    /// Returns the number of rows removed.
    fn delete_superseded(
        &self,
        owner_id: &Uuid,
        content_type: &ContentType,
        content_ref_id: &str,
        keep: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Number of rows stored for an owner.
    fn count(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
