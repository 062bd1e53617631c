//! Database Client Capability
//!
//! The engine does not own connections or transports. Callers supply a
//! client implementing [`TaxonomyClient`] (read queries) and, when mutations
//! are needed, [`MutableTaxonomyClient`] (row mutation and transaction
//! control). One libsql-backed implementation ships with the crate; any
//! driver can be adapted by returning rows as JSON objects keyed by column
//! name.
//!
//! Mutation capability is a distinct trait rather than an optional method:
//! a service constructed without a mutable client cannot reach the reparent
//! path at all, and the capability check happens once at construction.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A value bound to a SQL statement placeholder
///
/// The adapter for each driver maps these onto its native parameter types
/// (libsql has no boolean, so `Bool` lands as 0/1 there).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Null,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(s) => Self::Text(s.to_string()),
            None => Self::Null,
        }
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => Self::Text(s),
            None => Self::Null,
        }
    }
}

/// Result of a read query
#[derive(Debug, Default)]
pub struct QueryOutcome {
    /// Rows as JSON objects keyed by column name.
    pub rows: Vec<Value>,
    pub row_count: usize,
}

/// Read access to taxonomy storage
///
/// Implementations must be `Send + Sync`; futures may move between threads.
#[async_trait]
pub trait TaxonomyClient: Send + Sync {
    /// Execute a read statement and return all matching rows
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryOutcome>;
}

/// Mutation access to taxonomy storage
///
/// Required by the emulated-dialect reparent path, which issues
/// `BEGIN`/`COMMIT`/`ROLLBACK` and bulk row mutations through [`execute`].
///
/// [`execute`]: MutableTaxonomyClient::execute
#[async_trait]
pub trait MutableTaxonomyClient: TaxonomyClient {
    /// Execute a mutation or transaction-control statement
    ///
    /// Returns the affected-row count reported by the driver.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;
}
