//! Learned per-owner preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Preference type adjusted by the feedback loop when output is approved.
pub const TONE_PREFERENCE: &str = "tone";

/// A learned preference with a running-average confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub owner_id: Uuid,
    pub preference_type: String,
    pub value: Value,
    /// Confidence in [0, 1]; a running average over `sample_size` observations.
    pub confidence_score: f32,
    pub sample_size: u32,
    pub last_updated: DateTime<Utc>,
}

impl PreferenceRecord {
    pub fn new(
        owner_id: Uuid,
        preference_type: impl Into<String>,
        value: Value,
        confidence_score: f32,
    ) -> Self {
        Self {
            owner_id,
            preference_type: preference_type.into(),
            value,
            confidence_score: clamp_confidence(confidence_score),
            sample_size: 1,
            last_updated: Utc::now(),
        }
    }

    /// Blend one observation into the running average.
    ///
    /// `score' = clamp01((score * n + observation) / (n + 1))`, `n' = n + 1`.
    pub fn blend(&mut self, observation: f32) {
        let n = self.sample_size as f32;
        let blended = (self.confidence_score * n + observation) / (n + 1.0);
        self.confidence_score = clamp_confidence(blended);
        self.sample_size = self.sample_size.saturating_add(1);
        self.last_updated = Utc::now();
    }
}

/// Clamp a confidence value to [0, 1], mapping NaN to 0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
