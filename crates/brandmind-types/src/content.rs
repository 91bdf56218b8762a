//! Stored content types for Brandmind.
//!
//! Content is any text an owner wants to retrieve later: brand profile
//! renderings, marketing copy, learning examples from edited agent output.
//! Each stored item carries its embedding and an open metadata bag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Kind of stored content, used to scope retrieval.
///
/// Unknown kinds round-trip through `Custom` so new producers do not need a
/// release of this crate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    BrandProfile,
    MarketingCopy,
    Campaign,
    LearningExample,
    Document,
    Custom(String),
}

impl ContentType {
    /// Human-readable label used when a chunk has no better source name.
    pub fn label(&self) -> String {
        match self {
            ContentType::BrandProfile => "Brand profile".to_string(),
            ContentType::MarketingCopy => "Marketing copy".to_string(),
            ContentType::Campaign => "Campaign".to_string(),
            ContentType::LearningExample => "Learning example".to_string(),
            ContentType::Document => "Document".to_string(),
            ContentType::Custom(name) => name.replace('_', " "),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::BrandProfile => write!(f, "brand_profile"),
            ContentType::MarketingCopy => write!(f, "marketing_copy"),
            ContentType::Campaign => write!(f, "campaign"),
            ContentType::LearningExample => write!(f, "learning_example"),
            ContentType::Document => write!(f, "document"),
            ContentType::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "brand_profile" => ContentType::BrandProfile,
            "marketing_copy" => ContentType::MarketingCopy,
            "campaign" => ContentType::Campaign,
            "learning_example" => ContentType::LearningExample,
            "document" => ContentType::Document,
            _ => ContentType::Custom(normalized),
        })
    }
}

impl From<String> for ContentType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(content_type) => content_type,
            Err(never) => match never {},
        }
    }
}

impl From<ContentType> for String {
    fn from(value: ContentType) -> Self {
        value.to_string()
    }
}

/// Metadata attached to stored content.
///
/// A handful of keys are recognized and typed; everything else lands in
/// `extra` and is preserved verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Where the content came from (e.g., "brand_voice", "campaign_wizard").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Display title for the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Agent that produced the content, for learning examples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Performance tier reported for marketing copy ("high", "medium", "low").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_tier: Option<String>,
    /// Position of this chunk within a chunked document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    /// Total chunks the source document was split into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentMetadata {
    /// Metadata with only `source` set.
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }
}

/// Content submitted for storage, before it has been embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContent {
    pub owner_id: Uuid,
    pub content_type: ContentType,
    pub content: String,
    #[serde(default)]
    pub metadata: ContentMetadata,
    /// Optional link to the domain record this content was derived from.
    #[serde(default)]
    pub content_ref_id: Option<String>,
}

/// A row in the `embeddings` table: content plus its vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEmbedding {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content_type: ContentType,
    pub content_ref_id: Option<String>,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: ContentMetadata,
    pub created_at: DateTime<Utc>,
}
