//! LibsqlClient - Bundled Embedded Backend
//!
//! Implements the taxonomy client traits over libsql, the crate's embedded
//! SQLite-compatible backend. This is the reference implementation of the
//! emulated dialect and the harness the integration tests run against.
//!
//! All statements share one connection. The emulated reparent path drives
//! explicit `BEGIN`/`COMMIT`/`ROLLBACK` statements through [`execute`], and
//! those only compose when every statement of the transaction lands on the
//! same connection.
//!
//! [`execute`]: crate::db::MutableTaxonomyClient::execute
//!
//! # Examples
//!
//! ```rust,no_run
//! use taxonomy_core::db::LibsqlClient;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = LibsqlClient::new(PathBuf::from("./data/taxonomy.db")).await?;
//!     # let _ = client;
//!     Ok(())
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use libsql::{params_from_iter, Builder, Connection};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::db::client::{MutableTaxonomyClient, QueryOutcome, SqlValue, TaxonomyClient};
use crate::db::error::DatabaseError;

/// Embedded libsql client for taxonomy storage
pub struct LibsqlClient {
    /// Shared connection; transaction statements must not hop connections.
    conn: Connection,
}

impl LibsqlClient {
    /// Open (or create) a database file and initialize the schema
    ///
    /// Ensures the parent directory exists, opens the database, enables WAL
    /// mode, busy timeout, and foreign keys, and creates the `categories`
    /// table and indexes idempotently.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created,
    /// the connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Self::open(db_path).await
    }

    /// Open a fresh in-memory database (used heavily by tests)
    pub async fn new_in_memory() -> Result<Self, DatabaseError> {
        Self::open(PathBuf::from(":memory:")).await
    }

    async fn open(db_path: PathBuf) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;
        let conn = db.connect()?;

        let client = Self { conn };
        client.initialize_schema().await?;
        Ok(client)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so query() is required instead of
    /// execute().
    async fn execute_pragma(&self, pragma: &str) -> Result<(), DatabaseError> {
        let mut stmt = self.conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{pragma}': {e}"))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{pragma}': {e}"))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent (CREATE TABLE IF NOT EXISTS); safe to call on every open.
    /// The path index is non-unique; duplicate-path rejection is a
    /// creation-time rule, not a storage constraint.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.execute_pragma("PRAGMA journal_mode = WAL").await?;
        self.execute_pragma("PRAGMA busy_timeout = 5000").await?;
        self.execute_pragma("PRAGMA foreign_keys = ON").await?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS categories (
                    tenant_id TEXT NOT NULL,
                    category_id TEXT NOT NULL,
                    parent_id TEXT,
                    identifier TEXT NOT NULL,
                    slug TEXT NOT NULL,
                    name TEXT NOT NULL,
                    path TEXT NOT NULL,
                    depth INTEGER NOT NULL,
                    child_count INTEGER NOT NULL DEFAULT 0,
                    mode TEXT NOT NULL DEFAULT 'standard',
                    is_selectable BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                    PRIMARY KEY (tenant_id, category_id)
                )",
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create categories table: {e}"
                ))
            })?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_categories_tenant_path
                 ON categories (tenant_id, path)",
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::initialization_failed(format!("Failed to create path index: {e}"))
            })?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_categories_tenant_parent
                 ON categories (tenant_id, parent_id)",
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::initialization_failed(format!("Failed to create parent index: {e}"))
            })?;

        Ok(())
    }

    fn to_libsql_values(params: &[SqlValue]) -> Vec<libsql::Value> {
        params
            .iter()
            .map(|value| match value {
                SqlValue::Text(s) => libsql::Value::Text(s.clone()),
                SqlValue::Integer(i) => libsql::Value::Integer(*i),
                // SQLite has no boolean storage class
                SqlValue::Bool(b) => libsql::Value::Integer(i64::from(*b)),
                SqlValue::Null => libsql::Value::Null,
            })
            .collect()
    }

    fn column_to_json(value: libsql::Value) -> Value {
        match value {
            libsql::Value::Null => Value::Null,
            libsql::Value::Integer(i) => Value::from(i),
            libsql::Value::Real(f) => Value::from(f),
            libsql::Value::Text(s) => Value::String(s),
            // No blob columns exist in the categories schema
            libsql::Value::Blob(_) => Value::Null,
        }
    }
}

#[async_trait]
impl TaxonomyClient for LibsqlClient {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryOutcome> {
        let mut stmt = self.conn.prepare(sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare query: {e}"))
        })?;

        let mut rows = stmt
            .query(params_from_iter(Self::to_libsql_values(params)))
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to execute query: {e}")))?;

        let column_names: Vec<String> = (0..rows.column_count())
            .map(|i| rows.column_name(i).unwrap_or_default().to_string())
            .collect();

        let mut decoded = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read row: {e}")))?
        {
            let mut object = Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = row.get_value(i as i32).map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to read column {name}: {e}"))
                })?;
                object.insert(name.clone(), Self::column_to_json(value));
            }
            decoded.push(Value::Object(object));
        }

        let row_count = decoded.len();
        Ok(QueryOutcome {
            rows: decoded,
            row_count,
        })
    }
}

#[async_trait]
impl MutableTaxonomyClient for LibsqlClient {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let affected = self
            .conn
            .execute(sql, params_from_iter(Self::to_libsql_values(params)))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute statement: {e}"))
            })?;
        Ok(affected)
    }
}
