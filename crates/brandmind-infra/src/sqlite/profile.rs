//! SQLite brand profile repository.
//!
//! Implements `BrandProfileRepository` from `brandmind-core`. Collection
//! fields are stored as JSON text columns.

use sqlx::Row;
use uuid::Uuid;

use brandmind_core::brand::BrandProfileRepository;
use brandmind_types::error::RepositoryError;
use brandmind_types::profile::BrandProfile;

use super::pool::DatabasePool;
use super::{format_datetime, from_json, parse_datetime, parse_uuid, to_json};

/// SQLite-backed implementation of `BrandProfileRepository`.
#[derive(Clone)]
pub struct SqliteBrandProfileRepository {
    pool: DatabasePool,
}

impl SqliteBrandProfileRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ProfileRow {
    id: String,
    owner_id: String,
    brand_name: Option<String>,
    voice_tone: String,
    style_guidelines: String,
    brand_colors: String,
    brand_values: String,
    competitor_mentions: String,
    taboo_topics: String,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            brand_name: row.try_get("brand_name")?,
            voice_tone: row.try_get("voice_tone")?,
            style_guidelines: row.try_get("style_guidelines")?,
            brand_colors: row.try_get("brand_colors")?,
            brand_values: row.try_get("brand_values")?,
            competitor_mentions: row.try_get("competitor_mentions")?,
            taboo_topics: row.try_get("taboo_topics")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_profile(self) -> Result<BrandProfile, RepositoryError> {
        Ok(BrandProfile {
            id: parse_uuid(&self.id, "profile id")?,
            owner_id: parse_uuid(&self.owner_id, "owner_id")?,
            brand_name: self.brand_name,
            voice_tone: from_json(&self.voice_tone, "voice_tone")?,
            style_guidelines: from_json(&self.style_guidelines, "style_guidelines")?,
            brand_colors: from_json(&self.brand_colors, "brand_colors")?,
            brand_values: from_json(&self.brand_values, "brand_values")?,
            competitor_mentions: from_json(&self.competitor_mentions, "competitor_mentions")?,
            taboo_topics: from_json(&self.taboo_topics, "taboo_topics")?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl BrandProfileRepository for SqliteBrandProfileRepository {
    async fn get(&self, owner_id: &Uuid) -> Result<Option<BrandProfile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM brand_profiles WHERE owner_id = ?")
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let parsed =
                    ProfileRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(parsed.into_profile()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, profile: &BrandProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO brand_profiles (id, owner_id, brand_name, voice_tone, style_guidelines, brand_colors, brand_values, competitor_mentions, taboo_topics, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(owner_id) DO UPDATE SET
                   brand_name = excluded.brand_name,
                   voice_tone = excluded.voice_tone,
                   style_guidelines = excluded.style_guidelines,
                   brand_colors = excluded.brand_colors,
                   brand_values = excluded.brand_values,
                   competitor_mentions = excluded.competitor_mentions,
                   taboo_topics = excluded.taboo_topics,
                   updated_at = excluded.updated_at"#,
        )
        .bind(profile.id.to_string())
        .bind(profile.owner_id.to_string())
        .bind(&profile.brand_name)
        .bind(to_json(&profile.voice_tone)?)
        .bind(to_json(&profile.style_guidelines)?)
        .bind(to_json(&profile.brand_colors)?)
        .bind(to_json(&profile.brand_values)?)
        .bind(to_json(&profile.competitor_mentions)?)
        .bind(to_json(&profile.taboo_topics)?)
        .bind(format_datetime(&profile.created_at))
        .bind(format_datetime(&profile.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_db;
    use brandmind_types::profile::{FocusPreference, StyleGuidelines};

    #[tokio::test]
    async fn test_get_missing_profile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteBrandProfileRepository::new(test_db::pool(&dir).await);
        assert!(repo.get(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteBrandProfileRepository::new(test_db::pool(&dir).await);
        let owner = Uuid::now_v7();

        let mut profile = BrandProfile::new(owner);
        profile.brand_name = Some("Northwind".to_string());
        profile.voice_tone.insert("friendly".to_string(), 0.8);
        profile.brand_values.insert("craft".to_string());
        profile.style_guidelines = StyleGuidelines {
            focus_preference: Some(FocusPreference::Benefits),
            ..Default::default()
        };
        repo.upsert(&profile).await.unwrap();

        profile.brand_name = Some("Northwind Traders".to_string());
        profile.taboo_topics.insert("politics".to_string());
        repo.upsert(&profile).await.unwrap();

        let loaded = repo.get(&owner).await.unwrap().unwrap();
        assert_eq!(loaded.id, profile.id);
        assert_eq!(loaded.brand_name.as_deref(), Some("Northwind Traders"));
        assert_eq!(loaded.voice_tone, profile.voice_tone);
        assert_eq!(loaded.style_guidelines, profile.style_guidelines);
        assert!(loaded.taboo_topics.contains("politics"));

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM brand_profiles")
            .fetch_one(&repo.pool.reader)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
