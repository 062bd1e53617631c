//! Taxonomy Service - Subtree and Ancestor Queries over Materialized Paths
//!
//! The façade callers use for every taxonomy operation: subtree fetches,
//! ancestor chains, subtree reparenting, and category creation. The service
//! assembles tenant-scoped SQL for the configured [`Dialect`] and hands it
//! to the caller-supplied client.
//!
//! # Architecture
//!
//! - **Hierarchical dialect**: the backend understands hierarchical paths
//!   natively (`ltree` containment operators, `$n` placeholders). Subtree
//!   reparenting is one atomic server-side procedure call.
//! - **Emulated dialect**: paths are plain strings. Containment becomes
//!   equality-or-LIKE-prefix predicates, placeholders are `?`, and
//!   reparenting is a hand-run transaction (see `reparent`).
//!
//! Every statement is predicated on `tenant_id`; no query returns or
//! mutates another tenant's rows.
//!
//! # Examples
//!
//! ```rust,no_run
//! use taxonomy_core::db::LibsqlClient;
//! use taxonomy_core::services::{TaxonomyConfig, TaxonomyService};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = Arc::new(LibsqlClient::new_in_memory().await?);
//! let service = TaxonomyService::with_mutations(client, TaxonomyConfig::default());
//!
//! let subtree = service
//!     .fetch_subtree("acme", "electronics.mobile", None, true)
//!     .await?;
//! let moved = service
//!     .reparent_subtree("acme", "cat-mobile", None, Some("ops@acme"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{Dialect, MutableTaxonomyClient, QueryOutcome, SqlParams, TaxonomyClient};
use crate::models::{build_path, segment_count, CategoryRow, PathInput, ValidationError};
use crate::services::error::TaxonomyError;

mod create;
mod reparent;

pub use create::CreateCategoryParams;

/// Column list shared by every row-returning statement
pub(crate) const CATEGORY_COLUMNS: &str = "tenant_id, category_id, parent_id, identifier, slug, \
     name, path, depth, child_count, mode, is_selectable, created_at, updated_at";

/// Direction of an ancestor-chain result
///
/// `Ascending` walks root-to-target (shallow to deep); `Descending` walks
/// target-to-root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AncestorOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl AncestorOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Service configuration
///
/// `reparent_fn` names the server-side procedure the hierarchical dialect
/// delegates reparenting to; the emulated dialect never reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    pub dialect: Dialect,
    pub table: String,
    pub reparent_fn: String,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Emulated,
            table: "categories".to_string(),
            reparent_fn: "reparent_category_subtree".to_string(),
        }
    }
}

/// Service for querying and mutating tenant-scoped taxonomies
pub struct TaxonomyService {
    client: Arc<dyn TaxonomyClient>,
    /// Mutation capability, fixed at construction. Read-only services reject
    /// reparent and create calls with a transaction error.
    mutator: Option<Arc<dyn MutableTaxonomyClient>>,
    config: TaxonomyConfig,
}

impl TaxonomyService {
    /// Create a read-only service
    ///
    /// Subtree and ancestor queries work; reparent and create calls fail
    /// with [`TaxonomyError::Transaction`] on the emulated dialect.
    pub fn new<C>(client: Arc<C>, config: TaxonomyConfig) -> Self
    where
        C: TaxonomyClient + 'static,
    {
        Self {
            client,
            mutator: None,
            config,
        }
    }

    /// Create a service with mutation capability
    pub fn with_mutations<C>(client: Arc<C>, config: TaxonomyConfig) -> Self
    where
        C: MutableTaxonomyClient + 'static,
    {
        Self {
            client: client.clone(),
            mutator: Some(client),
            config,
        }
    }

    pub fn config(&self) -> &TaxonomyConfig {
        &self.config
    }

    /// Fetch a category subtree: the root row plus all descendants
    ///
    /// `path` accepts anything [`build_path`] accepts and is normalized
    /// first. Results are ordered by `path` ascending, which guarantees
    /// parents sort before their children. An unknown path yields an empty
    /// Vec, never an error.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - tenant scope; required
    /// * `path` - subtree root path (string or segment list)
    /// * `depth_limit` - optional cap on levels below the root
    /// * `include_root` - when false, the exact root-path row is excluded
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty tenant or unusable path, `Storage`
    /// for driver failures.
    pub async fn fetch_subtree(
        &self,
        tenant_id: &str,
        path: impl Into<PathInput>,
        depth_limit: Option<i64>,
        include_root: bool,
    ) -> Result<Vec<CategoryRow>, TaxonomyError> {
        require_identifier(tenant_id, "tenantId")?;
        let root = build_path(path)?;
        tracing::debug!("Fetching subtree '{}' for tenant {}", root, tenant_id);

        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let mut sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM {} WHERE tenant_id = {tenant_ph}",
            self.config.table
        );

        match self.config.dialect {
            Dialect::Hierarchical => {
                let root_ph = params.push(root.as_str());
                sql.push_str(&format!(" AND path <@ {root_ph}::ltree"));
                if !include_root {
                    let exclude_ph = params.push(root.as_str());
                    sql.push_str(&format!(" AND path <> {exclude_ph}::ltree"));
                }
            }
            Dialect::Emulated => {
                if include_root {
                    let root_ph = params.push(root.as_str());
                    let prefix_ph = params.push(format!("{root}.%"));
                    sql.push_str(&format!(
                        " AND (path = {root_ph} OR path LIKE {prefix_ph})"
                    ));
                } else {
                    let prefix_ph = params.push(format!("{root}.%"));
                    sql.push_str(&format!(" AND path LIKE {prefix_ph}"));
                }
            }
        }

        if let Some(limit) = depth_limit {
            let base_depth = segment_count(&root) as i64 - 1;
            let depth_ph = params.push(base_depth + limit);
            sql.push_str(&format!(" AND depth <= {depth_ph}"));
        }

        sql.push_str(" ORDER BY path ASC");

        let outcome = self.client.query(&sql, params.values()).await?;
        decode_rows(outcome)
    }

    /// Fetch the ancestor chain of a category
    ///
    /// The hierarchical dialect resolves this in a single containment join.
    /// The emulated dialect needs two round trips - the string emulation has
    /// no single-statement containment join - so it first resolves the
    /// target's path by id, then matches candidates by prefix. A missing
    /// target yields an empty Vec on both dialects.
    ///
    /// # Arguments
    ///
    /// * `include_self` - when false, the target row itself is excluded
    /// * `order` - `Ascending` = root-to-target, `Descending` = target-to-root
    ///
    /// # Errors
    ///
    /// Returns `Validation` when `tenant_id` or `category_id` is empty.
    pub async fn fetch_ancestors(
        &self,
        tenant_id: &str,
        category_id: &str,
        include_self: bool,
        order: AncestorOrder,
    ) -> Result<Vec<CategoryRow>, TaxonomyError> {
        require_identifier(tenant_id, "tenantId")?;
        require_identifier(category_id, "categoryId")?;
        tracing::debug!(
            "Fetching ancestors of {} for tenant {}",
            category_id,
            tenant_id
        );

        match self.config.dialect {
            Dialect::Hierarchical => {
                self.fetch_ancestors_hierarchical(tenant_id, category_id, include_self, order)
                    .await
            }
            Dialect::Emulated => {
                self.fetch_ancestors_emulated(tenant_id, category_id, include_self, order)
                    .await
            }
        }
    }

    /// Single-query ancestor lookup via the native containment operator
    async fn fetch_ancestors_hierarchical(
        &self,
        tenant_id: &str,
        category_id: &str,
        include_self: bool,
        order: AncestorOrder,
    ) -> Result<Vec<CategoryRow>, TaxonomyError> {
        let table = &self.config.table;
        let mut params = SqlParams::new(self.config.dialect);
        let category_ph = params.push(category_id);
        let tenant_ph = params.push(tenant_id);

        let exclude = if include_self {
            ""
        } else {
            " AND c.category_id <> t.category_id"
        };

        let sql = format!(
            "SELECT {} FROM {table} c \
             JOIN {table} t ON t.tenant_id = c.tenant_id AND t.category_id = {category_ph} \
             WHERE c.tenant_id = {tenant_ph} AND c.path @> t.path{exclude} \
             ORDER BY c.depth {}",
            qualified_columns("c"),
            order.as_sql()
        );

        let outcome = self.client.query(&sql, params.values()).await?;
        decode_rows(outcome)
    }

    /// Two-round-trip ancestor lookup for the string emulation
    async fn fetch_ancestors_emulated(
        &self,
        tenant_id: &str,
        category_id: &str,
        include_self: bool,
        order: AncestorOrder,
    ) -> Result<Vec<CategoryRow>, TaxonomyError> {
        let table = &self.config.table;

        // Round trip 1: resolve the target's path by id
        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let category_ph = params.push(category_id);
        let sql = format!(
            "SELECT path FROM {table} \
             WHERE tenant_id = {tenant_ph} AND category_id = {category_ph}"
        );
        let outcome = self.client.query(&sql, params.values()).await?;

        let Some(target_path) = outcome
            .rows
            .first()
            .and_then(|row| row.get("path"))
            .and_then(|path| path.as_str())
            .map(str::to_string)
        else {
            return Ok(Vec::new());
        };

        // Round trip 2: a candidate is on the chain when the target path
        // equals it or extends it by at least one segment
        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let predicate = if include_self {
            let self_ph = params.push(target_path.as_str());
            let prefix_ph = params.push(target_path.as_str());
            format!("(path = {self_ph} OR {prefix_ph} LIKE path || '.%')")
        } else {
            let prefix_ph = params.push(target_path.as_str());
            format!("{prefix_ph} LIKE path || '.%'")
        };

        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM {table} \
             WHERE tenant_id = {tenant_ph} AND {predicate} ORDER BY depth {}",
            order.as_sql()
        );

        let outcome = self.client.query(&sql, params.values()).await?;
        decode_rows(outcome)
    }

    /// The mutable client, or a transaction error for read-only services
    pub(crate) fn mutator(
        &self,
        operation: &str,
    ) -> Result<&Arc<dyn MutableTaxonomyClient>, TaxonomyError> {
        self.mutator.as_ref().ok_or_else(|| {
            TaxonomyError::transaction(format!(
                "{operation} requires a client with execute support"
            ))
        })
    }

    /// Load one category row by id within a tenant
    pub(crate) async fn load_node(
        &self,
        client: &dyn MutableTaxonomyClient,
        tenant_id: &str,
        category_id: &str,
    ) -> Result<Option<CategoryRow>, TaxonomyError> {
        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let category_ph = params.push(category_id);
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM {} \
             WHERE tenant_id = {tenant_ph} AND category_id = {category_ph}",
            self.config.table
        );

        let outcome = client.query(&sql, params.values()).await?;
        let mut rows = decode_rows(outcome)?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }
}

/// Reject empty identifiers before they reach SQL
pub(crate) fn require_identifier(value: &str, field: &str) -> Result<(), TaxonomyError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()).into());
    }
    Ok(())
}

/// Decode client rows into typed category rows
pub(crate) fn decode_rows(outcome: QueryOutcome) -> Result<Vec<CategoryRow>, TaxonomyError> {
    outcome
        .rows
        .into_iter()
        .map(|row| {
            serde_json::from_value::<CategoryRow>(row)
                .map_err(|e| TaxonomyError::storage(format!("Failed to decode category row: {e}")))
        })
        .collect()
}

fn qualified_columns(alias: &str) -> String {
    CATEGORY_COLUMNS
        .split(", ")
        .map(|column| format!("{alias}.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod taxonomy_service_test;
