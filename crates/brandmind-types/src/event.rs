//! Events broadcast by the learning and brand-voice services.
//!
//! Background work (preference nudges, profile re-embedding) reports its
//! outcome through these events. All variants are Clone + Send + Sync for use
//! with tokio broadcast channels.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feedback::FeedbackAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LearningEvent {
    /// A feedback event was accepted by the learner.
    FeedbackRecorded {
        owner_id: Uuid,
        agent_name: String,
        action: FeedbackAction,
    },

    /// A preference confidence was reinforced after a positive window.
    PreferenceReinforced {
        owner_id: Uuid,
        preference_type: String,
        confidence_score: f32,
        sample_size: u32,
    },

    /// Edits dominate recent feedback; the owner's preferences may need a
    /// manual review. No automatic adjustment is made.
    PreferenceReviewSuggested {
        owner_id: Uuid,
        agent_name: String,
        edit_rate: f32,
    },

    /// The rendered brand profile was re-embedded into semantic memory.
    ProfileRefreshed { owner_id: Uuid, embedding_id: Uuid },

    /// Re-embedding the brand profile failed. The profile itself was saved.
    ProfileRefreshFailed { owner_id: Uuid, error: String },
}

impl LearningEvent {
    pub fn owner_id(&self) -> Uuid {
        match self {
            LearningEvent::FeedbackRecorded { owner_id, .. }
            | LearningEvent::PreferenceReinforced { owner_id, .. }
            | LearningEvent::PreferenceReviewSuggested { owner_id, .. }
            | LearningEvent::ProfileRefreshed { owner_id, .. }
            | LearningEvent::ProfileRefreshFailed { owner_id, .. } => *owner_id,
        }
    }
}
