use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use ivr_core::Record;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RecordSourceError {
    #[error("record file not found at {0}")]
    Missing(PathBuf),

    #[error("record file {path} is not a valid id -> record mapping")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only lookup of ticket and train records.
///
/// An absent key is `Ok(None)`; errors are reserved for backend failures.
pub trait RecordRepository: Send + Sync {
    async fn lookup(&self, key: &str) -> Result<Option<Record>>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<HashMap<String, Record>>,
}

impl MemoryStore {
    pub fn from_records(records: impl IntoIterator<Item = (String, Record)>) -> Self {
        Self {
            records: Arc::new(records.into_iter().collect()),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let records: HashMap<String, Record> = serde_json::from_str(raw)?;
        Ok(Self {
            records: Arc::new(records),
        })
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(RecordSourceError::Missing(path.to_path_buf()).into());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed reading record file {}", path.display()));
            }
        };

        let store = Self::from_json_str(&raw).map_err(|source| RecordSourceError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), records = store.len(), "loaded record file");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &Record)> {
        self.records.iter()
    }
}

impl RecordRepository for MemoryStore {
    async fn lookup(&self, key: &str) -> Result<Option<Record>> {
        Ok(self.records.get(key).cloned())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the database, creating the file when it does not exist yet so
    /// `import` can seed a fresh path.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
              id TEXT PRIMARY KEY,
              payload_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upserts records, used to seed a database from a record file.
    pub async fn import<'a>(
        &self,
        records: impl IntoIterator<Item = (&'a String, &'a Record)>,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0_u64;

        for (id, record) in records {
            let payload_json = serde_json::to_string(record)?;
            sqlx::query(
                r#"
                INSERT INTO records (id, payload_json)
                VALUES (?1, ?2)
                ON CONFLICT(id) DO UPDATE SET
                  payload_json=excluded.payload_json
                "#,
            )
            .bind(id)
            .bind(payload_json)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;
        Ok(written)
    }
}

impl RecordRepository for SqliteStore {
    async fn lookup(&self, key: &str) -> Result<Option<Record>> {
        let row = sqlx::query("SELECT payload_json FROM records WHERE id = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload_json: String = row.get("payload_json");
        let record = serde_json::from_str(&payload_json)
            .with_context(|| format!("stored record {} is malformed", key))?;
        Ok(Some(record))
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub async fn json_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::Memory(MemoryStore::from_json_file(path).await?))
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Memory(_) => "json",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl From<MemoryStore> for Store {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl RecordRepository for Store {
    async fn lookup(&self, key: &str) -> Result<Option<Record>> {
        match self {
            Store::Memory(store) => store.lookup(key).await,
            Store::Sqlite(store) => store.lookup(key).await,
        }
    }
}
