//! Repository traits for feedback events and learned preferences.
//!
//! SQLite implementations live in brandmind-infra.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use brandmind_types::error::RepositoryError;
use brandmind_types::feedback::FeedbackEvent;
use brandmind_types::preference::PreferenceRecord;

/// Append-only log of feedback events.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait FeedbackRepository: Send + Sync {
    fn append(
        &self,
        event: &FeedbackEvent,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Most recent events for `(owner_id, agent_name)` created at or after
    /// `since`, newest first, at most `limit`.
    fn recent(
        &self,
        owner_id: &Uuid,
        agent_name: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<FeedbackEvent>, RepositoryError>> + Send;
}

/// Storage for per-owner preference records, unique on
/// `(owner_id, preference_type)`.
pub trait PreferenceRepository: Send + Sync {
    fn get(
        &self,
        owner_id: &Uuid,
        preference_type: &str,
    ) -> impl std::future::Future<Output = Result<Option<PreferenceRecord>, RepositoryError>> + Send;

    /// Insert or overwrite the record for its `(owner_id, preference_type)`.
    fn upsert(
        &self,
        record: &PreferenceRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All records for an owner, ordered by preference type.
    fn list(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<PreferenceRecord>, RepositoryError>> + Send;
}
