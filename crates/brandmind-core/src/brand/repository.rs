//! BrandProfileRepository trait. The SQLite implementation lives in
//! brandmind-infra.

use uuid::Uuid;

use brandmind_types::error::RepositoryError;
use brandmind_types::profile::BrandProfile;

/// Persistent storage for brand profiles, one per owner.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait BrandProfileRepository: Send + Sync {
    fn get(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<BrandProfile>, RepositoryError>> + Send;

    /// Insert the profile, or overwrite the existing row for its owner.
    fn upsert(
        &self,
        profile: &BrandProfile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
