//! Feedback learner: records feedback and nudges preference confidence.
//!
//! Every recorded event triggers an evaluation of the recent feedback window
//! for its `(owner, agent)`. A mostly-approved window reinforces the owner's
//! tone preference in a detached task; an edit-heavy window only publishes a
//! review suggestion. Nothing here ever fails the caller's flow.
//!
//! Blends of the same `(owner, preference)` are serialized, so overlapping
//! reinforcement tasks each add exactly one sample.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use brandmind_types::content::{ContentMetadata, ContentType};
use brandmind_types::error::RepositoryError;
use brandmind_types::event::LearningEvent;
use brandmind_types::feedback::{FeedbackAction, FeedbackEvent, FeedbackSummary};
use brandmind_types::preference::{PreferenceRecord, TONE_PREFERENCE};

use crate::embedding::EmbeddingModel;
use crate::event::LearningEventBus;
use crate::storage::{ContentStore, EmbeddingRepository};

use super::repository::{FeedbackRepository, PreferenceRepository};

/// How far back the feedback window reaches.
pub const FEEDBACK_WINDOW_DAYS: i64 = 30;

/// Maximum events considered per window.
pub const FEEDBACK_WINDOW_LIMIT: usize = 50;

/// Windows smaller than this are ignored.
pub const MIN_EVENTS_FOR_LEARNING: usize = 5;

pub const POSITIVE_RATE_THRESHOLD: f32 = 0.7;
pub const EDIT_RATE_THRESHOLD: f32 = 0.5;

/// Observation blended into the tone preference after a positive window.
pub const POSITIVE_OBSERVATION: f32 = 1.0;

pub struct FeedbackLearner<M, R, F, P>
where
    M: EmbeddingModel,
    R: EmbeddingRepository,
    F: FeedbackRepository,
    P: PreferenceRepository,
{
    feedback: F,
    preferences: Arc<P>,
    blend_locks: Arc<BlendLocks>,
    content: Arc<ContentStore<M, R>>,
    events: LearningEventBus,
}

/// One async lock per `(owner, preference_type)` being blended.
#[derive(Default)]
struct BlendLocks {
    locks: DashMap<(Uuid, String), Arc<Mutex<()>>>,
}

impl BlendLocks {
    fn lock_for(&self, owner_id: &Uuid, preference_type: &str) -> Arc<Mutex<()>> {
        let entry = self
            .locks
            .entry((*owner_id, preference_type.to_string()))
            .or_default();
        Arc::clone(&*entry)
    }
}

impl<M, R, F, P> FeedbackLearner<M, R, F, P>
where
    M: EmbeddingModel,
    R: EmbeddingRepository,
    F: FeedbackRepository,
    P: PreferenceRepository + 'static,
{
    pub fn new(
        feedback: F,
        preferences: P,
        content: Arc<ContentStore<M, R>>,
        events: LearningEventBus,
    ) -> Self {
        Self {
            feedback,
            preferences: Arc::new(preferences),
            blend_locks: Arc::default(),
            content,
            events,
        }
    }

    pub fn events(&self) -> &LearningEventBus {
        &self.events
    }

    /// Record one piece of feedback on an agent's output.
    ///
    /// Storage failures are logged and swallowed. An edit with its edited
    /// text is also stored as a `learning_example` for retrieval.
    #[tracing::instrument(
        name = "record_feedback",
        skip(self, original_output, edited_output, note),
        fields(owner_id = %owner_id, agent_name = %agent_name, action = %action)
    )]
    pub async fn record_feedback(
        &self,
        owner_id: Uuid,
        agent_name: &str,
        action: FeedbackAction,
        original_output: &str,
        edited_output: Option<&str>,
        note: Option<&str>,
    ) {
        let mut event = FeedbackEvent::new(owner_id, agent_name, action, original_output);
        event.edited_output = edited_output.map(str::to_string);
        event.note = note.map(str::to_string);

        match self.feedback.append(&event).await {
            Ok(()) => self.events.publish(LearningEvent::FeedbackRecorded {
                owner_id,
                agent_name: agent_name.to_string(),
                action,
            }),
            Err(e) => tracing::warn!(error = %e, "failed to append feedback event"),
        }

        if action == FeedbackAction::Edit {
            if let Some(edited) = edited_output {
                self.store_edit_pair(&event, edited).await;
            }
        }

        self.evaluate_window(owner_id, agent_name).await;
    }

    /// Blend `delta` into an existing preference's running average.
    ///
    /// Returns the updated record, or `None` when the owner has no
    /// preference of that type (nothing is created).
    pub async fn adjust_preference_confidence(
        &self,
        owner_id: Uuid,
        preference_type: &str,
        delta: f32,
    ) -> Result<Option<PreferenceRecord>, RepositoryError> {
        blend_preference(
            &*self.preferences,
            &self.blend_locks,
            &owner_id,
            preference_type,
            delta,
        )
        .await
    }

    /// Seed or overwrite a preference with a fresh sample.
    pub async fn set_preference(
        &self,
        owner_id: Uuid,
        preference_type: &str,
        value: Value,
        confidence: f32,
    ) -> Result<PreferenceRecord, RepositoryError> {
        let record = PreferenceRecord::new(owner_id, preference_type, value, confidence);
        self.preferences.upsert(&record).await?;
        Ok(record)
    }

    pub async fn preferences(&self, owner_id: Uuid) -> Result<Vec<PreferenceRecord>, RepositoryError> {
        self.preferences.list(&owner_id).await
    }

    /// Statistics for the current feedback window of `(owner_id, agent_name)`.
    pub async fn feedback_summary(
        &self,
        owner_id: Uuid,
        agent_name: &str,
    ) -> Result<FeedbackSummary, RepositoryError> {
        let since = Utc::now() - Duration::days(FEEDBACK_WINDOW_DAYS);
        let window = self
            .feedback
            .recent(&owner_id, agent_name, since, FEEDBACK_WINDOW_LIMIT)
            .await?;
        Ok(FeedbackSummary::from_events(&window))
    }

    async fn store_edit_pair(&self, event: &FeedbackEvent, edited: &str) {
        let content = format!(
            "Original:\n{}\n\nEdited:\n{}",
            event.original_output, edited
        );
        let metadata = ContentMetadata {
            source: Some("feedback".to_string()),
            title: Some(format!("{} edit", event.agent_name)),
            agent_name: Some(event.agent_name.clone()),
            ..ContentMetadata::default()
        };

        if let Err(e) = self
            .content
            .store(
                event.owner_id,
                ContentType::LearningExample,
                &content,
                metadata,
                Some(event.id.to_string()),
            )
            .await
        {
            tracing::warn!(error = %e, "failed to store edit as learning example");
        }
    }

    async fn evaluate_window(&self, owner_id: Uuid, agent_name: &str) {
        let summary = match self.feedback_summary(owner_id, agent_name).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load feedback window");
                return;
            }
        };

        if summary.total < MIN_EVENTS_FOR_LEARNING {
            tracing::debug!(total = summary.total, "feedback window too small to learn from");
            return;
        }

        if summary.positive_rate() > POSITIVE_RATE_THRESHOLD {
            self.spawn_reinforcement(owner_id);
        }

        let edit_rate = summary.edit_rate();
        if edit_rate > EDIT_RATE_THRESHOLD {
            tracing::info!(edit_rate, "edits dominate recent feedback; preferences may need review");
            self.events.publish(LearningEvent::PreferenceReviewSuggested {
                owner_id,
                agent_name: agent_name.to_string(),
                edit_rate,
            });
        }
    }

    fn spawn_reinforcement(&self, owner_id: Uuid) {
        let preferences = Arc::clone(&self.preferences);
        let locks = Arc::clone(&self.blend_locks);
        let events = self.events.clone();

        tokio::spawn(async move {
            let blended = blend_preference(
                &*preferences,
                &locks,
                &owner_id,
                TONE_PREFERENCE,
                POSITIVE_OBSERVATION,
            )
            .await;
            match blended {
                Ok(Some(record)) => {
                    tracing::debug!(
                        owner_id = %owner_id,
                        confidence = record.confidence_score,
                        sample_size = record.sample_size,
                        "tone preference reinforced"
                    );
                    events.publish(LearningEvent::PreferenceReinforced {
                        owner_id,
                        preference_type: record.preference_type,
                        confidence_score: record.confidence_score,
                        sample_size: record.sample_size,
                    });
                }
                Ok(None) => {
                    tracing::debug!(owner_id = %owner_id, "no tone preference to reinforce");
                }
                Err(e) => {
                    tracing::warn!(owner_id = %owner_id, error = %e, "failed to reinforce tone preference");
                }
            }
        });
    }
}

async fn blend_preference<P: PreferenceRepository>(
    preferences: &P,
    locks: &BlendLocks,
    owner_id: &Uuid,
    preference_type: &str,
    observation: f32,
) -> Result<Option<PreferenceRecord>, RepositoryError> {
    let lock = locks.lock_for(owner_id, preference_type);
    let _guard = lock.lock().await;

    let Some(mut record) = preferences.get(owner_id, preference_type).await? else {
        return Ok(None);
    };
    record.blend(observation);
    preferences.upsert(&record).await?;
    Ok(Some(record))
}
