//! Category Creation
//!
//! Creation derives the stored hierarchy columns from the chosen parent:
//! `path` extends the parent's path by the new slug, `depth` is one below
//! it, and the parent's `child_count` is incremented in the same
//! transaction. There is no delete counterpart; deletion semantics are an
//! unresolved gap owned by the system owner.

use uuid::Uuid;

use crate::db::{Dialect, MutableTaxonomyClient, SqlParams};
use crate::models::{normalize_slug, CategoryRow, ValidationError};
use crate::services::error::TaxonomyError;
use crate::services::taxonomy_service::reparent::attempt_rollback;
use crate::services::taxonomy_service::{require_identifier, TaxonomyService};

/// Parameters for category creation
#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    /// Explicit id; generated (UUID v4) when absent.
    pub category_id: Option<String>,
    pub parent_id: Option<String>,
    pub identifier: String,
    pub slug: String,
    pub name: String,
    pub mode: String,
    pub is_selectable: bool,
}

impl TaxonomyService {
    /// Create a category under the chosen parent (or at the root level)
    ///
    /// Inserts the row with `child_count = 0`, increments the parent's
    /// `child_count`, and returns the stored row (database-generated
    /// timestamps included). Runs inside one transaction on both dialects.
    ///
    /// # Errors
    ///
    /// - `Validation` - empty tenant id, unusable slug, or a duplicate
    ///   category id/path within the tenant
    /// - `NotFound` - named parent absent for the tenant
    /// - `Transaction` - service constructed without mutation capability
    /// - `Storage` - driver failure (after a best-effort rollback)
    pub async fn create_category(
        &self,
        tenant_id: &str,
        params: CreateCategoryParams,
    ) -> Result<CategoryRow, TaxonomyError> {
        require_identifier(tenant_id, "tenantId")?;
        let slug = normalize_slug(&params.slug)?;
        let client = self.mutator("createCategory")?.clone();

        client.execute("BEGIN", &[]).await?;
        match self
            .create_in_transaction(client.as_ref(), tenant_id, &slug, &params)
            .await
        {
            Ok(row) => match client.execute("COMMIT", &[]).await {
                Ok(_) => {
                    tracing::debug!(
                        "Created category {} at '{}' for tenant {}",
                        row.category_id,
                        row.path,
                        tenant_id
                    );
                    Ok(row)
                }
                Err(commit_err) => {
                    attempt_rollback(client.as_ref()).await;
                    Err(commit_err.into())
                }
            },
            Err(err) => {
                attempt_rollback(client.as_ref()).await;
                Err(err)
            }
        }
    }

    async fn create_in_transaction(
        &self,
        client: &dyn MutableTaxonomyClient,
        tenant_id: &str,
        slug: &str,
        params: &CreateCategoryParams,
    ) -> Result<CategoryRow, TaxonomyError> {
        let table = &self.config.table;
        let category_id = params
            .category_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if self
            .load_node(client, tenant_id, &category_id)
            .await?
            .is_some()
        {
            return Err(ValidationError::Duplicate(category_id).into());
        }

        let parent = match params.parent_id.as_deref() {
            Some(parent_id) => Some(
                self.load_node(client, tenant_id, parent_id)
                    .await?
                    .ok_or_else(|| TaxonomyError::not_found(tenant_id, parent_id))?,
            ),
            None => None,
        };

        let (path, depth) = match &parent {
            Some(parent) => (format!("{}.{slug}", parent.path), parent.depth + 1),
            None => (slug.to_string(), 0),
        };

        if self.path_exists(client, tenant_id, &path).await? {
            return Err(ValidationError::Duplicate(path).into());
        }

        let mut sql_params = SqlParams::new(self.config.dialect);
        let tenant_ph = sql_params.push(tenant_id);
        let category_ph = sql_params.push(category_id.as_str());
        let parent_ph = sql_params.push(params.parent_id.clone());
        let identifier_ph = sql_params.push(params.identifier.as_str());
        let slug_ph = sql_params.push(slug);
        let name_ph = sql_params.push(params.name.as_str());
        let path_ph = sql_params.push(path.as_str());
        let depth_ph = sql_params.push(depth);
        let mode_ph = sql_params.push(params.mode.as_str());
        let selectable_ph = sql_params.push(params.is_selectable);
        let sql = format!(
            "INSERT INTO {table} (tenant_id, category_id, parent_id, identifier, slug, name, \
             path, depth, child_count, mode, is_selectable) \
             VALUES ({tenant_ph}, {category_ph}, {parent_ph}, {identifier_ph}, {slug_ph}, \
             {name_ph}, {}, {depth_ph}, 0, {mode_ph}, {selectable_ph})",
            self.path_expr(&path_ph)
        );
        client.execute(&sql, sql_params.values()).await?;

        if let Some(parent) = &parent {
            let mut sql_params = SqlParams::new(self.config.dialect);
            let tenant_ph = sql_params.push(tenant_id);
            let parent_ph = sql_params.push(parent.category_id.as_str());
            let sql = format!(
                "UPDATE {table} SET child_count = child_count + 1, \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE tenant_id = {tenant_ph} AND category_id = {parent_ph}"
            );
            client.execute(&sql, sql_params.values()).await?;
        }

        // Reload so database-generated fields are authoritative
        self.load_node(client, tenant_id, &category_id)
            .await?
            .ok_or_else(|| TaxonomyError::storage("Category row missing after insert"))
    }

    async fn path_exists(
        &self,
        client: &dyn MutableTaxonomyClient,
        tenant_id: &str,
        path: &str,
    ) -> Result<bool, TaxonomyError> {
        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let path_ph = params.push(path);
        let sql = format!(
            "SELECT category_id FROM {} WHERE tenant_id = {tenant_ph} AND path = {}",
            self.config.table,
            self.path_expr(&path_ph)
        );

        Ok(!client.query(&sql, params.values()).await?.rows.is_empty())
    }

    /// Path parameters need an explicit cast where the column type is ltree
    fn path_expr(&self, placeholder: &str) -> String {
        match self.config.dialect {
            Dialect::Hierarchical => format!("{placeholder}::ltree"),
            Dialect::Emulated => placeholder.to_string(),
        }
    }
}
