//! SQLite token storage
//!
//! One row per application id in a `(app_id TEXT PRIMARY KEY, tokens TEXT)`
//! table; writes are single-statement upserts.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lightspeed_core::TokenStorage;
use lightspeed_domain::constants::{DEFAULT_APP_ID, DEFAULT_TOKEN_TABLE};
use lightspeed_domain::{Result, RetailError, TokenRecord};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tokio::task;
use tracing::{info, instrument};

use super::document::{record_to_document, DocumentStore};
use crate::errors::to_retail;

const POOL_SIZE: u32 = 4;

/// SQLite-backed implementation of [`TokenStorage`].
#[derive(Debug, Clone)]
pub struct SqliteTokenStorage {
    pool: Arc<Pool<SqliteConnectionManager>>,
    table: Arc<str>,
    app_id: Arc<str>,
}

impl SqliteTokenStorage {
    /// Open (or create) the database at `path` and ensure the token table.
    ///
    /// # Errors
    /// - [`RetailError::Config`] for an invalid table name
    /// - [`RetailError::Storage`] if the database cannot be opened
    #[instrument(skip_all, fields(db_path = %path.as_ref().display()))]
    pub fn open(
        path: impl AsRef<Path>,
        table_name: Option<&str>,
        app_id: Option<&str>,
    ) -> Result<Self> {
        let table = table_name.unwrap_or(DEFAULT_TOKEN_TABLE);
        validate_table_name(table)?;

        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder().max_size(POOL_SIZE).build(manager).map_err(to_retail)?;

        let conn = pool.get().map_err(to_retail)?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                app_id TEXT PRIMARY KEY,
                tokens TEXT NOT NULL
            )"
        ))
        .map_err(to_retail)?;

        info!(table, "SQLite token storage ready");

        Ok(Self {
            pool: Arc::new(pool),
            table: Arc::from(table),
            app_id: Arc::from(app_id.unwrap_or(DEFAULT_APP_ID)),
        })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RetailError::Config(format!("invalid token table name: {name:?}")))
    }
}

#[async_trait]
impl DocumentStore for SqliteTokenStorage {
    async fn load_document(&self) -> Result<Option<Value>> {
        let pool = Arc::clone(&self.pool);
        let table = Arc::clone(&self.table);
        let app_id = Arc::clone(&self.app_id);

        let raw = task::spawn_blocking(move || -> Result<Option<String>> {
            let conn = pool.get().map_err(to_retail)?;
            conn.query_row(
                &format!("SELECT tokens FROM {table} WHERE app_id = ?1"),
                params![app_id.as_ref()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(to_retail)
        })
        .await
        .map_err(to_retail)??;

        match raw {
            Some(json) => serde_json::from_str(&json).map(Some).map_err(|e| {
                RetailError::Storage(format!("stored token row is not valid JSON: {e}"))
            }),
            None => Ok(None),
        }
    }

    async fn save_document(&self, document: &Value) -> Result<()> {
        let pool = Arc::clone(&self.pool);
        let table = Arc::clone(&self.table);
        let app_id = Arc::clone(&self.app_id);
        let json = serde_json::to_string(document)?;

        task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get().map_err(to_retail)?;
            conn.execute(
                &format!(
                    "INSERT INTO {table} (app_id, tokens) VALUES (?1, ?2)
                     ON CONFLICT(app_id) DO UPDATE SET tokens = excluded.tokens"
                ),
                params![app_id.as_ref(), json],
            )
            .map_err(to_retail)?;
            Ok(())
        })
        .await
        .map_err(to_retail)?
    }
}

#[async_trait]
impl TokenStorage for SqliteTokenStorage {
    async fn get_tokens(&self) -> Result<TokenRecord> {
        match self.load_document().await? {
            Some(document) => Ok(serde_json::from_value(document)?),
            None => Ok(TokenRecord::empty()),
        }
    }

    async fn set_tokens(&self, record: &TokenRecord) -> Result<()> {
        self.save_document(&record_to_document(record)?).await
    }
}
