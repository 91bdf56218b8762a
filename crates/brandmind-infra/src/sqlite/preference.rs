//! SQLite preference store, unique on `(owner_id, preference_type)`.

use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use brandmind_core::learning::PreferenceRepository;
use brandmind_types::error::RepositoryError;
use brandmind_types::preference::PreferenceRecord;

use super::pool::DatabasePool;
use super::{format_datetime, from_json, parse_datetime, parse_uuid, to_json};

/// SQLite-backed implementation of `PreferenceRepository`.
#[derive(Clone)]
pub struct SqlitePreferenceRepository {
    pool: DatabasePool,
}

impl SqlitePreferenceRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct PreferenceRow {
    owner_id: String,
    preference_type: String,
    value: String,
    confidence_score: f64,
    sample_size: i64,
    last_updated: String,
}

impl PreferenceRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            owner_id: row.try_get("owner_id")?,
            preference_type: row.try_get("preference_type")?,
            value: row.try_get("value")?,
            confidence_score: row.try_get("confidence_score")?,
            sample_size: row.try_get("sample_size")?,
            last_updated: row.try_get("last_updated")?,
        })
    }

    fn into_record(self) -> Result<PreferenceRecord, RepositoryError> {
        let value: Value = from_json(&self.value, "preference value")?;
        Ok(PreferenceRecord {
            owner_id: parse_uuid(&self.owner_id, "owner_id")?,
            preference_type: self.preference_type,
            value,
            confidence_score: self.confidence_score as f32,
            sample_size: self.sample_size.max(0) as u32,
            last_updated: parse_datetime(&self.last_updated)?,
        })
    }
}

impl PreferenceRepository for SqlitePreferenceRepository {
    async fn get(
        &self,
        owner_id: &Uuid,
        preference_type: &str,
    ) -> Result<Option<PreferenceRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM preferences WHERE owner_id = ? AND preference_type = ?")
            .bind(owner_id.to_string())
            .bind(preference_type)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let parsed = PreferenceRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(parsed.into_record()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, record: &PreferenceRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO preferences (owner_id, preference_type, value, confidence_score, sample_size, last_updated)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(owner_id, preference_type) DO UPDATE SET
                   value = excluded.value,
                   confidence_score = excluded.confidence_score,
                   sample_size = excluded.sample_size,
                   last_updated = excluded.last_updated"#,
        )
        .bind(record.owner_id.to_string())
        .bind(&record.preference_type)
        .bind(to_json(&record.value)?)
        .bind(record.confidence_score as f64)
        .bind(record.sample_size as i64)
        .bind(format_datetime(&record.last_updated))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, owner_id: &Uuid) -> Result<Vec<PreferenceRecord>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM preferences WHERE owner_id = ? ORDER BY preference_type")
            .bind(owner_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let parsed =
                PreferenceRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            records.push(parsed.into_record()?);
        }

        Ok(records)
    }
}
