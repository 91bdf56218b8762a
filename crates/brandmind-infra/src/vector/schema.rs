//! Arrow schema for the per-owner content tables in LanceDB.
//!
//! The vector width is fixed per table and comes from the configured
//! embedding model, so every table of a store shares one dimension.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// Name of the similarity column LanceDB appends to vector search results.
pub const DISTANCE_COLUMN: &str = "_distance";

/// Element field of the `vector` column.
pub fn vector_item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, true))
}

/// Schema for one owner's embedded content.
///
/// `metadata` holds the JSON encoding of `ContentMetadata`.
pub fn content_schema(dimension: i32) -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("owner_id", DataType::Utf8, false),
        Field::new("content_type", DataType::Utf8, false),
        Field::new("content_ref_id", DataType::Utf8, true),
        Field::new("content", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(vector_item_field(), dimension),
            false,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_schema_fields() {
        let schema = content_schema(8);
        assert_eq!(schema.fields().len(), 8);
        assert!(schema.field_with_name("content_ref_id").unwrap().is_nullable());
        assert!(!schema.field_with_name("content").unwrap().is_nullable());

        match schema.field_with_name("vector").unwrap().data_type() {
            DataType::FixedSizeList(_, size) => assert_eq!(*size, 8),
            other => panic!("Expected FixedSizeList, got {:?}", other),
        }
    }
}
