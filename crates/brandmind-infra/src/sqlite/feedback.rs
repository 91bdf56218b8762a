//! SQLite feedback event log.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use brandmind_core::learning::FeedbackRepository;
use brandmind_types::error::RepositoryError;
use brandmind_types::feedback::{FeedbackAction, FeedbackEvent};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `FeedbackRepository`.
#[derive(Clone)]
pub struct SqliteFeedbackRepository {
    pool: DatabasePool,
}

impl SqliteFeedbackRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct FeedbackRow {
    id: String,
    owner_id: String,
    agent_name: String,
    action: String,
    original_output: String,
    edited_output: Option<String>,
    note: Option<String>,
    created_at: String,
}

impl FeedbackRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            agent_name: row.try_get("agent_name")?,
            action: row.try_get("action")?,
            original_output: row.try_get("original_output")?,
            edited_output: row.try_get("edited_output")?,
            note: row.try_get("note")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_event(self) -> Result<FeedbackEvent, RepositoryError> {
        let action: FeedbackAction = self
            .action
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(FeedbackEvent {
            id: parse_uuid(&self.id, "feedback id")?,
            owner_id: parse_uuid(&self.owner_id, "owner_id")?,
            agent_name: self.agent_name,
            action,
            original_output: self.original_output,
            edited_output: self.edited_output,
            note: self.note,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl FeedbackRepository for SqliteFeedbackRepository {
    async fn append(&self, event: &FeedbackEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO feedback_events (id, owner_id, agent_name, action, original_output, edited_output, note, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(event.id.to_string())
        .bind(event.owner_id.to_string())
        .bind(&event.agent_name)
        .bind(event.action.to_string())
        .bind(&event.original_output)
        .bind(&event.edited_output)
        .bind(&event.note)
        .bind(format_datetime(&event.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn recent(
        &self,
        owner_id: &Uuid,
        agent_name: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<FeedbackEvent>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM feedback_events
               WHERE owner_id = ? AND agent_name = ? AND created_at >= ?
               ORDER BY created_at DESC, id DESC
               LIMIT ?"#,
        )
        .bind(owner_id.to_string())
        .bind(agent_name)
        .bind(format_datetime(&since))
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let parsed =
                FeedbackRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            events.push(parsed.into_event()?);
        }

        Ok(events)
    }
}
