//! LanceDB connection and table lifecycle.
//!
//! Each owner's content lives in its own table (`content_{owner_id}`), so a
//! search never sees another owner's rows.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_schema::Schema;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Directory under the data dir holding the LanceDB files.
pub const VECTOR_STORE_DIR: &str = "vector_store";

/// LanceDB connection rooted at one directory.
pub struct LanceVectorStore {
    db: lancedb::Connection,
    base_path: PathBuf,
    /// Held while a missing table is created, so concurrent first writes for
    /// the same owner do not race each other.
    create_lock: Mutex<()>,
}

impl LanceVectorStore {
    /// Open or create a store at `base_path`, creating the directory if needed.
    pub async fn new(base_path: PathBuf) -> Result<Self, lancedb::Error> {
        std::fs::create_dir_all(&base_path).map_err(|e| lancedb::Error::CreateDir {
            path: base_path.display().to_string(),
            source: e,
        })?;

        let uri = base_path
            .to_str()
            .ok_or_else(|| lancedb::Error::InvalidInput {
                message: format!("Path contains invalid UTF-8: {}", base_path.display()),
            })?;

        let db = lancedb::connect(uri).execute().await?;

        Ok(Self {
            db,
            base_path,
            create_lock: Mutex::new(()),
        })
    }

    /// Open the store under `{data_dir}/vector_store`.
    pub async fn in_data_dir(data_dir: &Path) -> Result<Self, lancedb::Error> {
        Self::new(data_dir.join(VECTOR_STORE_DIR)).await
    }

    /// Open `table_name` if it exists.
    pub async fn open_table(&self, table_name: &str) -> Result<Option<lancedb::Table>, lancedb::Error> {
        match self.db.open_table(table_name).execute().await {
            Ok(table) => Ok(Some(table)),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Open `table_name`, creating it empty with `schema` if it is missing.
    pub async fn ensure_table(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
    ) -> Result<lancedb::Table, lancedb::Error> {
        if let Some(table) = self.open_table(table_name).await? {
            return Ok(table);
        }

        let _guard = self.create_lock.lock().await;
        if let Some(table) = self.open_table(table_name).await? {
            return Ok(table);
        }
        tracing::debug!(table = table_name, "creating vector table");
        self.db
            .create_empty_table(table_name, schema)
            .execute()
            .await
    }

    pub async fn table_names(&self) -> Result<Vec<String>, lancedb::Error> {
        self.db.table_names().execute().await
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Table holding one owner's content.
    pub fn owner_table_name(owner_id: &Uuid) -> String {
        format!("content_{}", owner_id.simple())
    }
}
