//! Retrieval query and result types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::collections::BTreeSet;

use crate::content::{ContentMetadata, ContentType};

/// Default number of chunks returned by a retrieval.
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 5;

/// Default minimum cosine similarity for a candidate to be considered.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// A semantic retrieval request scoped to one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub text: String,
    pub owner_id: Uuid,
    /// Restrict results to these content types. Empty means any type.
    #[serde(default)]
    pub content_types: BTreeSet<ContentType>,
    pub limit: usize,
    /// Minimum similarity in [0, 1].
    pub similarity_threshold: f32,
    #[serde(default)]
    pub include_metadata: bool,
}

impl RetrievalQuery {
    /// Create a query with the default limit and threshold, any content type,
    /// and metadata included.
    pub fn new(owner_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            owner_id,
            content_types: BTreeSet::new(),
            limit: DEFAULT_RETRIEVAL_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            include_metadata: true,
        }
    }

    pub fn with_content_types(mut self, types: impl IntoIterator<Item = ContentType>) -> Self {
        self.content_types = types.into_iter().collect();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the similarity threshold, clamped to [0, 1].
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }
}

/// A raw candidate returned by the similarity search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub content: String,
    pub content_type: ContentType,
    pub content_ref_id: Option<String>,
    pub metadata: Option<ContentMetadata>,
    pub similarity: f32,
}

/// A ranked piece of content in a retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: Uuid,
    pub content: String,
    pub content_type: ContentType,
    pub content_ref_id: Option<String>,
    pub metadata: Option<ContentMetadata>,
    pub similarity: f32,
    /// Short label describing where the chunk came from.
    pub source_label: String,
}

impl RetrievedChunk {
    /// Build a chunk from a search hit, dropping metadata unless requested.
    ///
    /// The source label prefers the metadata title, then the metadata source,
    /// then the content type's label.
    pub fn from_hit(hit: SearchHit, include_metadata: bool) -> Self {
        let source_label = hit
            .metadata
            .as_ref()
            .and_then(|m| m.title.clone().or_else(|| m.source.clone()))
            .unwrap_or_else(|| hit.content_type.label());

        Self {
            id: hit.id,
            content: hit.content,
            content_type: hit.content_type,
            content_ref_id: hit.content_ref_id,
            metadata: if include_metadata { hit.metadata } else { None },
            similarity: hit.similarity,
            source_label,
        }
    }
}

/// Outcome of a retrieval: chunks ordered by non-increasing similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunks: Vec<RetrievedChunk>,
    /// Candidates that survived filtering, before truncation to `limit`.
    pub total_matched: usize,
    pub original_query: String,
    pub elapsed_ms: u64,
}

impl RetrievalResult {
    /// An empty result ("no relevant context found").
    pub fn empty(original_query: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            chunks: Vec::new(),
            total_matched: 0,
            original_query: original_query.into(),
            elapsed_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
