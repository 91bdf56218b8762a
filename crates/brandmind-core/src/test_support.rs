//! In-memory collaborators for unit tests.
//!
//! Every stub is `Clone` and shares its state between clones, so a test can
//! hand one copy to a service and inspect call counts through another.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use brandmind_types::content::{ContentType, StoredEmbedding};
use brandmind_types::error::{EmbeddingError, RepositoryError, SearchError};
use brandmind_types::feedback::FeedbackEvent;
use brandmind_types::preference::PreferenceRecord;
use brandmind_types::profile::BrandProfile;
use brandmind_types::retrieval::SearchHit;

use crate::brand::BrandProfileRepository;
use crate::embedding::{EmbeddingModel, Fingerprinter};
use crate::learning::{FeedbackRepository, PreferenceRepository};
use crate::retrieval::SimilaritySearch;
use crate::storage::EmbeddingRepository;

fn storage_failure() -> RepositoryError {
    RepositoryError::Query("stub storage failure".to_string())
}

/// Uses the text itself as its fingerprint.
pub struct IdentityFingerprinter;

impl Fingerprinter for IdentityFingerprinter {
    fn fingerprint(&self, text: &str) -> String {
        text.to_string()
    }
}

#[derive(Default)]
struct ModelState {
    calls: AtomicUsize,
    fail_all: AtomicBool,
    failing: Mutex<HashSet<String>>,
}

/// Deterministic model: folds the text's bytes into `dimension` buckets.
#[derive(Clone)]
pub struct StubEmbeddingModel {
    dimension: usize,
    state: Arc<ModelState>,
}

impl StubEmbeddingModel {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Fail every call for exactly this text.
    pub fn fail_on(&self, text: &str) {
        self.state.failing.lock().unwrap().insert(text.to_string());
    }

    pub fn fail_all(&self, fail: bool) {
        self.state.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dimension] += f32::from(byte) / 255.0;
        }
        vector[0] += 1.0;
        vector
    }
}

impl EmbeddingModel for StubEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.state.fail_all.load(Ordering::SeqCst)
            || self.state.failing.lock().unwrap().contains(text);
        if failing {
            return Err(EmbeddingError::ServiceUnavailable("stub outage".to_string()));
        }
        Ok(self.vector_for(text))
    }

    fn model_name(&self) -> &str {
        "stub-embedder"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// A search hit with no metadata.
pub fn hit(content: &str, content_type: ContentType, similarity: f32) -> SearchHit {
    SearchHit {
        id: Uuid::now_v7(),
        content: content.to_string(),
        content_type,
        content_ref_id: None,
        metadata: None,
        similarity,
    }
}

#[derive(Default)]
struct SearchState {
    hits: Mutex<Vec<SearchHit>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    last_request: Mutex<Option<(f32, usize)>>,
}

/// Returns canned hits at or above the requested threshold, in the order
/// they were given.
#[derive(Clone, Default)]
pub struct StubSearch {
    state: Arc<SearchState>,
}

impl StubSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        let search = Self::default();
        search.set_hits(hits);
        search
    }

    pub fn set_hits(&self, hits: Vec<SearchHit>) {
        *self.state.hits.lock().unwrap() = hits;
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn last_threshold(&self) -> Option<f32> {
        self.state.last_request.lock().unwrap().map(|(t, _)| t)
    }

    pub fn last_max_count(&self) -> Option<usize> {
        self.state.last_request.lock().unwrap().map(|(_, n)| n)
    }
}

impl SimilaritySearch for StubSearch {
    async fn search(
        &self,
        _owner_id: &Uuid,
        _query_embedding: &[f32],
        threshold: f32,
        max_count: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        *self.state.last_request.lock().unwrap() = Some((threshold, max_count));

        let delay = *self.state.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(SearchError::ServiceUnavailable("stub outage".to_string()));
        }

        let hits = self.state.hits.lock().unwrap().clone();
        Ok(hits
            .into_iter()
            .filter(|h| h.similarity >= threshold)
            .take(max_count)
            .collect())
    }
}

#[derive(Default)]
struct EmbeddingRows {
    rows: Mutex<Vec<StoredEmbedding>>,
    failing: AtomicBool,
    failing_inserts: AtomicBool,
}

/// Embedding rows in a vector. Also searchable by cosine similarity, so
/// store-then-retrieve flows can run without a database.
#[derive(Clone, Default)]
pub struct InMemoryEmbeddingRepo {
    state: Arc<EmbeddingRows>,
}

impl InMemoryEmbeddingRepo {
    pub fn rows(&self) -> Vec<StoredEmbedding> {
        self.state.rows.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail writes of new rows only; deletes and counts still succeed.
    pub fn set_failing_inserts(&self, failing: bool) {
        self.state.failing_inserts.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.state.failing.load(Ordering::SeqCst) {
            Err(storage_failure())
        } else {
            Ok(())
        }
    }
}

impl EmbeddingRepository for InMemoryEmbeddingRepo {
    async fn insert(&self, row: &StoredEmbedding) -> Result<(), RepositoryError> {
        self.check()?;
        if self.state.failing_inserts.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        self.state.rows.lock().unwrap().push(row.clone());
        Ok(())
    }

    async fn delete_superseded(
        &self,
        owner_id: &Uuid,
        content_type: &ContentType,
        content_ref_id: &str,
        keep: &Uuid,
    ) -> Result<u64, RepositoryError> {
        self.check()?;
        let mut rows = self.state.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| {
            r.id == *keep
                || !(r.owner_id == *owner_id
                    && r.content_type == *content_type
                    && r.content_ref_id.as_deref() == Some(content_ref_id))
        });
        Ok((before - rows.len()) as u64)
    }

    async fn count(&self, owner_id: &Uuid) -> Result<u64, RepositoryError> {
        self.check()?;
        let rows = self.state.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| r.owner_id == *owner_id).count() as u64)
    }
}

impl SimilaritySearch for InMemoryEmbeddingRepo {
    async fn search(
        &self,
        owner_id: &Uuid,
        query_embedding: &[f32],
        threshold: f32,
        max_count: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let rows = self.state.rows.lock().unwrap().clone();
        let mut hits: Vec<SearchHit> = rows
            .into_iter()
            .filter(|r| r.owner_id == *owner_id)
            .map(|r| {
                let similarity = cosine(query_embedding, &r.embedding);
                SearchHit {
                    id: r.id,
                    content: r.content,
                    content_type: r.content_type,
                    content_ref_id: r.content_ref_id,
                    metadata: Some(r.metadata),
                    similarity,
                }
            })
            .filter(|h| h.similarity >= threshold)
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(max_count);
        Ok(hits)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Default)]
struct ProfileRows {
    rows: Mutex<HashMap<Uuid, BrandProfile>>,
    reads: AtomicUsize,
    failing: AtomicBool,
    fail_next_read: AtomicBool,
}

#[derive(Clone, Default)]
pub struct InMemoryProfileRepo {
    state: Arc<ProfileRows>,
}

impl InMemoryProfileRepo {
    pub fn insert(&self, profile: BrandProfile) {
        self.state.rows.lock().unwrap().insert(profile.owner_id, profile);
    }

    pub fn reads(&self) -> usize {
        self.state.reads.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.state.rows.lock().unwrap().is_empty()
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail only the next `get`; later reads succeed again.
    pub fn fail_next_read(&self) {
        self.state.fail_next_read.store(true, Ordering::SeqCst);
    }
}

impl BrandProfileRepository for InMemoryProfileRepo {
    async fn get(&self, owner_id: &Uuid) -> Result<Option<BrandProfile>, RepositoryError> {
        self.state.reads.fetch_add(1, Ordering::SeqCst);
        if self.state.failing.load(Ordering::SeqCst)
            || self.state.fail_next_read.swap(false, Ordering::SeqCst)
        {
            return Err(storage_failure());
        }
        Ok(self.state.rows.lock().unwrap().get(owner_id).cloned())
    }

    async fn upsert(&self, profile: &BrandProfile) -> Result<(), RepositoryError> {
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        self.insert(profile.clone());
        Ok(())
    }
}

#[derive(Default)]
struct FeedbackRows {
    events: Mutex<Vec<FeedbackEvent>>,
    failing: AtomicBool,
}

#[derive(Clone, Default)]
pub struct InMemoryFeedbackRepo {
    state: Arc<FeedbackRows>,
}

impl InMemoryFeedbackRepo {
    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.state.events.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }
}

impl FeedbackRepository for InMemoryFeedbackRepo {
    async fn append(&self, event: &FeedbackEvent) -> Result<(), RepositoryError> {
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        self.state.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn recent(
        &self,
        owner_id: &Uuid,
        agent_name: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<FeedbackEvent>, RepositoryError> {
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        let mut window: Vec<FeedbackEvent> = self
            .events()
            .into_iter()
            .filter(|e| e.owner_id == *owner_id && e.agent_name == agent_name && e.created_at >= since)
            .collect();
        window.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        window.truncate(limit);
        Ok(window)
    }
}

#[derive(Default)]
struct PreferenceRows {
    rows: Mutex<HashMap<(Uuid, String), PreferenceRecord>>,
    read_delay: Mutex<Option<Duration>>,
}

#[derive(Clone, Default)]
pub struct InMemoryPreferenceRepo {
    state: Arc<PreferenceRows>,
}

impl InMemoryPreferenceRepo {
    /// Sleep this long inside every `get`, like a round trip to a database.
    pub fn set_read_delay(&self, delay: Duration) {
        *self.state.read_delay.lock().unwrap() = Some(delay);
    }
}

impl PreferenceRepository for InMemoryPreferenceRepo {
    async fn get(
        &self,
        owner_id: &Uuid,
        preference_type: &str,
    ) -> Result<Option<PreferenceRecord>, RepositoryError> {
        let delay = *self.state.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let rows = self.state.rows.lock().unwrap();
        Ok(rows.get(&(*owner_id, preference_type.to_string())).cloned())
    }

    async fn upsert(&self, record: &PreferenceRecord) -> Result<(), RepositoryError> {
        self.state
            .rows
            .lock()
            .unwrap()
            .insert((record.owner_id, record.preference_type.clone()), record.clone());
        Ok(())
    }

    async fn list(&self, owner_id: &Uuid) -> Result<Vec<PreferenceRecord>, RepositoryError> {
        let rows = self.state.rows.lock().unwrap();
        let mut records: Vec<PreferenceRecord> = rows
            .values()
            .filter(|r| r.owner_id == *owner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.preference_type.cmp(&b.preference_type));
        Ok(records)
    }
}
