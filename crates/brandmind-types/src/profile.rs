//! Brand profile types.
//!
//! A brand profile captures how an owner's marketing copy should sound:
//! a voice-tone vector, coarse style guidelines, and brand constraints.
//! One profile per owner; it is created on first save and nudged over
//! time by the copy analyzer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Which side of the offer copy should lead with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusPreference {
    Benefits,
    Features,
}

/// How calls to action should be phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallToActionStyle {
    /// Imperative, time-bound ("Order today").
    Direct,
    /// Low-pressure invitation ("Come see what's new").
    Invitational,
}

/// Whether persuasion should lean on feeling or reasoning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersuasionApproach {
    Emotional,
    Logical,
}

/// Style guidelines for a brand.
///
/// The three learned keys are typed; hand-written guidelines from the UI
/// (e.g. `"emoji_usage": "sparingly"`) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleGuidelines {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_preference: Option<FocusPreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<CallToActionStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach: Option<PersuasionApproach>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StyleGuidelines {
    pub fn is_empty(&self) -> bool {
        self.focus_preference.is_none()
            && self.call_to_action.is_none()
            && self.approach.is_none()
            && self.extra.is_empty()
    }

    /// Render guidelines as `key: value` lines in a stable order.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(focus) = self.focus_preference {
            let v = match focus {
                FocusPreference::Benefits => "benefits",
                FocusPreference::Features => "features",
            };
            lines.push(format!("focus_preference: {v}"));
        }
        if let Some(cta) = self.call_to_action {
            let v = match cta {
                CallToActionStyle::Direct => "direct",
                CallToActionStyle::Invitational => "invitational",
            };
            lines.push(format!("call_to_action: {v}"));
        }
        if let Some(approach) = self.approach {
            let v = match approach {
                PersuasionApproach::Emotional => "emotional",
                PersuasionApproach::Logical => "logical",
            };
            lines.push(format!("approach: {v}"));
        }
        for (key, value) in &self.extra {
            match value {
                Value::String(s) => lines.push(format!("{key}: {s}")),
                other => lines.push(format!("{key}: {other}")),
            }
        }
        lines
    }
}

/// Persisted brand profile, exclusively owned by `owner_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub brand_name: Option<String>,
    /// Voice-tone dimension -> weight in [0, 1].
    pub voice_tone: BTreeMap<String, f32>,
    pub style_guidelines: StyleGuidelines,
    pub brand_colors: BTreeSet<String>,
    pub brand_values: BTreeSet<String>,
    pub competitor_mentions: Vec<Value>,
    pub taboo_topics: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BrandProfile {
    /// A fresh, empty profile for an owner.
    pub fn new(owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id,
            brand_name: None,
            voice_tone: BTreeMap::new(),
            style_guidelines: StyleGuidelines::default(),
            brand_colors: BTreeSet::new(),
            brand_values: BTreeSet::new(),
            competitor_mentions: Vec::new(),
            taboo_topics: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the fields present in `update`, replacing them wholesale.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.brand_name {
            self.brand_name = Some(name);
        }
        if let Some(tone) = update.voice_tone {
            self.voice_tone = tone;
        }
        if let Some(guidelines) = update.style_guidelines {
            self.style_guidelines = guidelines;
        }
        if let Some(colors) = update.brand_colors {
            self.brand_colors = colors;
        }
        if let Some(values) = update.brand_values {
            self.brand_values = values;
        }
        if let Some(mentions) = update.competitor_mentions {
            self.competitor_mentions = mentions;
        }
        if let Some(topics) = update.taboo_topics {
            self.taboo_topics = topics;
        }
        self.updated_at = Utc::now();
    }

    /// Voice-tone dimensions sorted by weight, highest first.
    ///
    /// Ties are broken by dimension name so the order is deterministic.
    pub fn top_tones(&self, n: usize) -> Vec<(&str, f32)> {
        let mut tones: Vec<(&str, f32)> = self
            .voice_tone
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        tones.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        tones.truncate(n);
        tones
    }

    /// Plain-text rendering of the profile, stored for semantic retrieval.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        match &self.brand_name {
            Some(name) => out.push_str(&format!("Brand voice profile for {name}.\n")),
            None => out.push_str("Brand voice profile.\n"),
        }

        let tones = self.top_tones(self.voice_tone.len());
        if !tones.is_empty() {
            let list: Vec<String> = tones.iter().map(|(k, v)| format!("{k} ({v:.2})")).collect();
            out.push_str(&format!("Voice tone: {}.\n", list.join(", ")));
        }

        let guidelines = self.style_guidelines.describe();
        if !guidelines.is_empty() {
            out.push_str(&format!("Style guidelines: {}.\n", guidelines.join("; ")));
        }
        if !self.brand_values.is_empty() {
            out.push_str(&format!("Brand values: {}.\n", join_set(&self.brand_values)));
        }
        if !self.brand_colors.is_empty() {
            out.push_str(&format!("Brand colors: {}.\n", join_set(&self.brand_colors)));
        }
        if !self.taboo_topics.is_empty() {
            out.push_str(&format!("Avoid: {}.\n", join_set(&self.taboo_topics)));
        }
        out.trim_end().to_string()
    }
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Partial profile write. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub voice_tone: Option<BTreeMap<String, f32>>,
    #[serde(default)]
    pub style_guidelines: Option<StyleGuidelines>,
    #[serde(default)]
    pub brand_colors: Option<BTreeSet<String>>,
    #[serde(default)]
    pub brand_values: Option<BTreeSet<String>>,
    #[serde(default)]
    pub competitor_mentions: Option<Vec<Value>>,
    #[serde(default)]
    pub taboo_topics: Option<BTreeSet<String>>,
}

/// How well a piece of copy performed, controlling how hard it pulls the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    High,
    Medium,
    Low,
}

impl PerformanceTier {
    /// Learning rate applied to signal scores for this tier.
    pub fn learning_rate(self) -> f32 {
        match self {
            PerformanceTier::High => 0.3,
            PerformanceTier::Medium => 0.2,
            PerformanceTier::Low => 0.1,
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceTier::High => write!(f, "high"),
            PerformanceTier::Medium => write!(f, "medium"),
            PerformanceTier::Low => write!(f, "low"),
        }
    }
}

impl FromStr for PerformanceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(PerformanceTier::High),
            "medium" => Ok(PerformanceTier::Medium),
            "low" => Ok(PerformanceTier::Low),
            other => Err(format!("invalid performance tier: '{other}'")),
        }
    }
}
