//! Embeds text and persists it for later retrieval.
//!
//! Single stores propagate failures with the failing stage distinguished.
//! Batch stores are best-effort: failed items are logged and dropped, and
//! callers compare input and output lengths to detect drops.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use uuid::Uuid;

use brandmind_types::config::StorageConfig;
use brandmind_types::content::{ContentMetadata, ContentType, NewContent, StoredEmbedding};
use brandmind_types::error::StoreError;

use crate::embedding::{EmbeddingModel, EmbeddingService};

use super::chunker::chunk_text;
use super::repository::EmbeddingRepository;

pub struct ContentStore<M: EmbeddingModel, R: EmbeddingRepository> {
    embeddings: Arc<EmbeddingService<M>>,
    repo: R,
    batch_size: usize,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl<M: EmbeddingModel, R: EmbeddingRepository> ContentStore<M, R> {
    pub fn new(embeddings: Arc<EmbeddingService<M>>, repo: R, config: &StorageConfig) -> Self {
        Self {
            embeddings,
            repo,
            batch_size: config.batch_size.max(1),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Embed and persist one piece of content, returning its new id.
    #[tracing::instrument(
        name = "store_content",
        skip(self, content, metadata, content_ref_id),
        fields(owner_id = %owner_id, content_type = %content_type)
    )]
    pub async fn store(
        &self,
        owner_id: Uuid,
        content_type: ContentType,
        content: &str,
        metadata: ContentMetadata,
        content_ref_id: Option<String>,
    ) -> Result<Uuid, StoreError> {
        let row = self
            .embed_row(NewContent {
                owner_id,
                content_type,
                content: content.to_string(),
                metadata,
                content_ref_id,
            })
            .await?;
        self.repo.insert(&row).await?;

        tracing::debug!(id = %row.id, "content stored");
        Ok(row.id)
    }

    /// Store many items in fixed-size sub-batches.
    ///
    /// Writes within a sub-batch run concurrently. Returns the ids of items
    /// that were stored, in input order.
    pub async fn store_batch(&self, items: Vec<NewContent>) -> Vec<Uuid> {
        let total = items.len();
        let mut stored = Vec::with_capacity(total);
        let mut items = items.into_iter().peekable();

        while items.peek().is_some() {
            let batch: Vec<NewContent> = items.by_ref().take(self.batch_size).collect();
            let results = join_all(batch.into_iter().map(|item| self.store_item(item))).await;
            for result in results {
                match result {
                    Ok(id) => stored.push(id),
                    Err(e) => tracing::warn!(error = %e, "dropping batch item that failed to store"),
                }
            }
        }

        if stored.len() < total {
            tracing::warn!(total, stored = stored.len(), "batch store dropped items");
        } else {
            tracing::debug!(total, "batch stored");
        }
        stored
    }

    /// Chunk a long text and store every chunk.
    ///
    /// Each chunk's metadata carries its `chunk_index` and the `chunk_count`
    /// of the document.
    pub async fn store_document(
        &self,
        owner_id: Uuid,
        content_type: ContentType,
        text: &str,
        metadata: ContentMetadata,
    ) -> Vec<Uuid> {
        let chunks = chunk_text(text, self.chunk_size, self.chunk_overlap);
        let count = chunks.len() as u32;

        let items = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| NewContent {
                owner_id,
                content_type: content_type.clone(),
                content: chunk,
                metadata: ContentMetadata {
                    chunk_index: Some(index as u32),
                    chunk_count: Some(count),
                    ..metadata.clone()
                },
                content_ref_id: None,
            })
            .collect();

        self.store_batch(items).await
    }

    /// Replace the rows derived from `item.content_ref_id` with a fresh one.
    ///
    /// The new row is written before older ones are removed, so a failure at
    /// any step leaves at least one rendering stored. A failed cleanup is
    /// logged and retried by the next replace.
    pub async fn replace(&self, item: NewContent) -> Result<Uuid, StoreError> {
        let row = self.embed_row(item).await?;
        self.repo.insert(&row).await?;

        if let Some(ref_id) = &row.content_ref_id {
            match self
                .repo
                .delete_superseded(&row.owner_id, &row.content_type, ref_id, &row.id)
                .await
            {
                Ok(removed) => {
                    tracing::debug!(removed, content_ref_id = %ref_id, "replaced previous rows");
                }
                Err(e) => {
                    tracing::warn!(error = %e, content_ref_id = %ref_id, "failed to remove superseded rows");
                }
            }
        }
        Ok(row.id)
    }

    async fn store_item(&self, item: NewContent) -> Result<Uuid, StoreError> {
        let row = self.embed_row(item).await?;
        self.repo.insert(&row).await?;
        Ok(row.id)
    }

    async fn embed_row(&self, item: NewContent) -> Result<StoredEmbedding, StoreError> {
        let vector = self.embeddings.embed(&item.content).await?;
        Ok(StoredEmbedding {
            id: Uuid::now_v7(),
            owner_id: item.owner_id,
            content_type: item.content_type,
            content_ref_id: item.content_ref_id,
            content: item.content,
            embedding: vector.to_vec(),
            metadata: item.metadata,
            created_at: Utc::now(),
        })
    }
}
