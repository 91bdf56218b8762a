//! LanceDB-backed content store and similarity search.
//!
//! Implements `EmbeddingRepository` and `SimilaritySearch` from
//! `brandmind-core`. Rows live in one table per owner; search is a cosine
//! vector query whose distance is reported back as `1 - distance`.

use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::Schema;
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use uuid::Uuid;

use brandmind_core::retrieval::SimilaritySearch;
use brandmind_core::storage::EmbeddingRepository;
use brandmind_types::content::{ContentMetadata, ContentType, StoredEmbedding};
use brandmind_types::error::{RepositoryError, SearchError};
use brandmind_types::retrieval::SearchHit;

use super::lance::LanceVectorStore;
use super::schema::{DISTANCE_COLUMN, content_schema, vector_item_field};
use crate::sqlite::{format_datetime, from_json, parse_uuid, to_json};

/// Content rows and their vectors, stored in LanceDB.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct LanceContentRepository {
    store: Arc<LanceVectorStore>,
    dimension: usize,
}

impl LanceContentRepository {
    pub fn new(store: Arc<LanceVectorStore>, dimension: usize) -> Self {
        Self { store, dimension }
    }

    fn width(&self) -> Result<i32, RepositoryError> {
        i32::try_from(self.dimension)
            .map_err(|_| RepositoryError::Query(format!("unsupported dimension {}", self.dimension)))
    }

    fn schema(&self) -> Result<Arc<Schema>, RepositoryError> {
        Ok(Arc::new(content_schema(self.width()?)))
    }

    async fn owner_table(&self, owner_id: &Uuid) -> Result<Option<lancedb::Table>, RepositoryError> {
        self.store
            .open_table(&LanceVectorStore::owner_table_name(owner_id))
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to open content table: {e}")))
    }

    async fn ensure_owner_table(&self, owner_id: &Uuid) -> Result<lancedb::Table, RepositoryError> {
        self.store
            .ensure_table(&LanceVectorStore::owner_table_name(owner_id), self.schema()?)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to ensure content table: {e}")))
    }

    fn build_record_batch(&self, row: &StoredEmbedding) -> Result<RecordBatch, RepositoryError> {
        if row.embedding.len() != self.dimension {
            return Err(RepositoryError::Query(format!(
                "embedding has {} dimensions, store expects {}",
                row.embedding.len(),
                self.dimension
            )));
        }

        let values = Float32Array::from(row.embedding.clone());
        let vector_array =
            FixedSizeListArray::try_new(vector_item_field(), self.width()?, Arc::new(values), None)
                .map_err(|e| RepositoryError::Query(format!("Failed to build vector column: {e}")))?;

        RecordBatch::try_new(
            self.schema()?,
            vec![
                Arc::new(StringArray::from(vec![row.id.to_string()])),
                Arc::new(StringArray::from(vec![row.owner_id.to_string()])),
                Arc::new(StringArray::from(vec![row.content_type.to_string()])),
                Arc::new(StringArray::from(vec![row.content_ref_id.clone()])),
                Arc::new(StringArray::from(vec![row.content.clone()])),
                Arc::new(StringArray::from(vec![to_json(&row.metadata)?])),
                Arc::new(StringArray::from(vec![format_datetime(&row.created_at)])),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| RepositoryError::Query(format!("Failed to build record batch: {e}")))
    }
}

/// Quote a value for a Lance SQL filter.
fn sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, RepositoryError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| RepositoryError::Query(format!("missing column {name}")))
}

/// Parse the rows of a vector search result into hits.
fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<SearchHit>, RepositoryError> {
    let ids = string_column(batch, "id")?;
    let content_types = string_column(batch, "content_type")?;
    let ref_ids = string_column(batch, "content_ref_id")?;
    let contents = string_column(batch, "content")?;
    let metadata = string_column(batch, "metadata")?;
    let distances = batch
        .column_by_name(DISTANCE_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| RepositoryError::Query(format!("missing column {DISTANCE_COLUMN}")))?;

    let mut hits = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let metadata: ContentMetadata = from_json(metadata.value(i), "metadata")?;
        hits.push(SearchHit {
            id: parse_uuid(ids.value(i), "content id")?,
            content: contents.value(i).to_string(),
            content_type: ContentType::from(content_types.value(i).to_string()),
            content_ref_id: (!ref_ids.is_null(i)).then(|| ref_ids.value(i).to_string()),
            metadata: Some(metadata),
            similarity: 1.0 - distances.value(i),
        });
    }
    Ok(hits)
}

impl EmbeddingRepository for LanceContentRepository {
    async fn insert(&self, row: &StoredEmbedding) -> Result<(), RepositoryError> {
        let batch = self.build_record_batch(row)?;
        let table = self.ensure_owner_table(&row.owner_id).await?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to add content: {e}")))?;

        Ok(())
    }

    async fn delete_superseded(
        &self,
        owner_id: &Uuid,
        content_type: &ContentType,
        content_ref_id: &str,
        keep: &Uuid,
    ) -> Result<u64, RepositoryError> {
        let Some(table) = self.owner_table(owner_id).await? else {
            return Ok(0);
        };

        let predicate = format!(
            "content_type = {} AND content_ref_id = {} AND id != {}",
            sql_string(&content_type.to_string()),
            sql_string(content_ref_id),
            sql_string(&keep.to_string()),
        );
        let removed = table
            .count_rows(Some(predicate.clone()))
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to count superseded rows: {e}")))?;
        if removed > 0 {
            table
                .delete(&predicate)
                .await
                .map_err(|e| RepositoryError::Query(format!("Failed to delete superseded rows: {e}")))?;
        }

        Ok(removed as u64)
    }

    async fn count(&self, owner_id: &Uuid) -> Result<u64, RepositoryError> {
        let Some(table) = self.owner_table(owner_id).await? else {
            return Ok(0);
        };
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to count rows: {e}")))?;

        Ok(count as u64)
    }
}

impl SimilaritySearch for LanceContentRepository {
    async fn search(
        &self,
        owner_id: &Uuid,
        query_embedding: &[f32],
        threshold: f32,
        max_count: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if max_count == 0 {
            return Ok(Vec::new());
        }
        if query_embedding.len() != self.dimension {
            return Err(SearchError::Query(format!(
                "query has {} dimensions, store expects {}",
                query_embedding.len(),
                self.dimension
            )));
        }

        let table = self
            .owner_table(owner_id)
            .await
            .map_err(|e| SearchError::ServiceUnavailable(e.to_string()))?;
        let Some(table) = table else {
            return Ok(Vec::new());
        };

        let results = table
            .vector_search(query_embedding)
            .map_err(|e| SearchError::Query(format!("Vector search setup failed: {e}")))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(max_count)
            .execute()
            .await
            .map_err(|e| SearchError::Query(format!("Vector search failed: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| SearchError::Query(format!("Failed to collect results: {e}")))?;

        let mut hits = Vec::new();
        for batch in &batches {
            let parsed = batch_to_hits(batch).map_err(|e| SearchError::Query(e.to_string()))?;
            hits.extend(parsed.into_iter().filter(|h| h.similarity >= threshold));
        }

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(max_count);
        Ok(hits)
    }
}
