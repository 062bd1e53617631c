//! Transactional Subtree Reparenting
//!
//! Moving a category takes its entire subtree along, and every derived
//! column must come out consistent: paths re-rooted under the new parent,
//! depths shifted by the level difference, and `child_count` exact for every
//! row in the tenant.
//!
//! The hierarchical dialect delegates all of that to one atomic server-side
//! procedure call. The emulated dialect has no such luxury and runs the
//! algorithm by hand inside an explicit transaction:
//!
//! 1. Load the moved node; missing means `NotFound`.
//! 2. Resolve the new parent and reject cycles before any write.
//! 3. Collect the subtree shallow-first with the same equality-or-prefix
//!    predicate the subtree fetch uses.
//! 4. Rewrite path and depth for every collected row.
//! 5. Repoint the moved node's `parent_id` (after the bulk rewrite, so the
//!    subtree scan is unaffected by the pointer change).
//! 6. Recount `child_count` across the whole tenant.
//!
//! Any failure rolls the transaction back and propagates the original
//! error. The engine takes no locks of its own; two concurrent reparents in
//! the same tenant can race on the recount in step 6, so callers needing
//! strict consistency serialize reparents per tenant.

use serde_json::Value;

use crate::db::{MutableTaxonomyClient, SqlParams};
use crate::models::{is_self_or_descendant, CategoryRow};
use crate::services::error::TaxonomyError;
use crate::services::taxonomy_service::{
    decode_rows, require_identifier, TaxonomyService, CATEGORY_COLUMNS,
};

impl TaxonomyService {
    /// Move a category and its whole subtree under a new parent
    ///
    /// `new_parent_id = None` moves the subtree to the root level. Returns
    /// the number of rows in the moved subtree (the node itself included),
    /// so reparenting a leaf returns 1.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` / `category_id` - the node to move; both required
    /// * `new_parent_id` - destination parent, or None for root placement
    /// * `actor` - audit identity; forwarded to the server-side procedure on
    ///   the hierarchical dialect, logged on the emulated dialect
    ///
    /// # Errors
    ///
    /// - `Validation` - empty tenant or category id
    /// - `NotFound` - node or destination parent absent for the tenant
    /// - `Cycle` - destination parent lies inside the moved subtree
    /// - `Transaction` - emulated dialect on a service constructed without
    ///   mutation capability
    /// - `Storage` - driver failure (after a best-effort rollback)
    pub async fn reparent_subtree(
        &self,
        tenant_id: &str,
        category_id: &str,
        new_parent_id: Option<&str>,
        actor: Option<&str>,
    ) -> Result<u64, TaxonomyError> {
        require_identifier(tenant_id, "tenantId")?;
        require_identifier(category_id, "categoryId")?;
        tracing::debug!(
            "Reparenting {} under {:?} for tenant {} (actor {:?})",
            category_id,
            new_parent_id,
            tenant_id,
            actor
        );

        match self.config.dialect {
            crate::db::Dialect::Hierarchical => {
                self.reparent_hierarchical(tenant_id, category_id, new_parent_id, actor)
                    .await
            }
            crate::db::Dialect::Emulated => {
                self.reparent_emulated(tenant_id, category_id, new_parent_id, actor)
                    .await
            }
        }
    }

    /// One atomic server-side call; correctness is delegated, not reimplemented
    async fn reparent_hierarchical(
        &self,
        tenant_id: &str,
        category_id: &str,
        new_parent_id: Option<&str>,
        actor: Option<&str>,
    ) -> Result<u64, TaxonomyError> {
        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let category_ph = params.push(category_id);
        let parent_ph = params.push(new_parent_id);
        let actor_ph = params.push(actor);

        let sql = format!(
            "SELECT {}({tenant_ph}, {category_ph}, {parent_ph}, {actor_ph}) AS moved",
            self.config.reparent_fn
        );

        let outcome = self.client.query(&sql, params.values()).await?;
        let moved = outcome
            .rows
            .first()
            .and_then(|row| row.get("moved"))
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                TaxonomyError::storage("Reparent procedure returned no affected-row count")
            })?;

        Ok(moved.max(0) as u64)
    }

    async fn reparent_emulated(
        &self,
        tenant_id: &str,
        category_id: &str,
        new_parent_id: Option<&str>,
        actor: Option<&str>,
    ) -> Result<u64, TaxonomyError> {
        let client = self.mutator("reparentSubtree")?.clone();

        client.execute("BEGIN", &[]).await?;
        match self
            .reparent_in_transaction(client.as_ref(), tenant_id, category_id, new_parent_id)
            .await
        {
            Ok(moved) => match client.execute("COMMIT", &[]).await {
                Ok(_) => {
                    tracing::debug!(
                        "Reparented {} rows rooted at {} for tenant {} (actor {:?})",
                        moved,
                        category_id,
                        tenant_id,
                        actor
                    );
                    Ok(moved)
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

    /// Steps 1-6 of the emulated algorithm; caller owns BEGIN/COMMIT/ROLLBACK
    async fn reparent_in_transaction(
        &self,
        client: &dyn MutableTaxonomyClient,
        tenant_id: &str,
        category_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<u64, TaxonomyError> {
        let table = &self.config.table;

        // Step 1: the node being moved
        let current = self
            .load_node(client, tenant_id, category_id)
            .await?
            .ok_or_else(|| TaxonomyError::not_found(tenant_id, category_id))?;

        // Step 2: resolve the destination and reject cycles before any write
        let new_parent = match new_parent_id {
            Some(parent_id) => {
                let parent = self
                    .load_node(client, tenant_id, parent_id)
                    .await?
                    .ok_or_else(|| TaxonomyError::not_found(tenant_id, parent_id))?;
                if is_self_or_descendant(&parent.path, &current.path) {
                    return Err(TaxonomyError::cycle(format!(
                        "cannot move {category_id} under {parent_id}: target parent is inside the moved subtree"
                    )));
                }
                Some(parent)
            }
            None => None,
        };

        // Step 3: the full subtree, shallow-first
        let subtree = self
            .collect_subtree(client, tenant_id, &current.path)
            .await?;

        // Step 4: rewrite path and depth for every row in the subtree
        for node in &subtree {
            let (new_path, new_depth) = rewrite_for_move(node, &current, new_parent.as_ref());

            let mut params = SqlParams::new(self.config.dialect);
            let path_ph = params.push(new_path.as_str());
            let depth_ph = params.push(new_depth);
            let tenant_ph = params.push(tenant_id);
            let category_ph = params.push(node.category_id.as_str());
            let sql = format!(
                "UPDATE {table} SET path = {path_ph}, depth = {depth_ph}, \
                 updated_at = CURRENT_TIMESTAMP \
                 WHERE tenant_id = {tenant_ph} AND category_id = {category_ph}"
            );
            client.execute(&sql, params.values()).await?;
        }

        // Step 5: repoint the moved node at its new parent
        let mut params = SqlParams::new(self.config.dialect);
        let parent_ph = params.push(new_parent_id);
        let tenant_ph = params.push(tenant_id);
        let category_ph = params.push(category_id);
        let sql = format!(
            "UPDATE {table} SET parent_id = {parent_ph}, updated_at = CURRENT_TIMESTAMP \
             WHERE tenant_id = {tenant_ph} AND category_id = {category_ph}"
        );
        client.execute(&sql, params.values()).await?;

        // Step 6: child_count is recomputed for the whole tenant
        self.recount_children(client, tenant_id).await?;

        Ok(subtree.len() as u64)
    }

    /// Node plus all descendants, ordered shallow-first
    async fn collect_subtree(
        &self,
        client: &dyn MutableTaxonomyClient,
        tenant_id: &str,
        root_path: &str,
    ) -> Result<Vec<CategoryRow>, TaxonomyError> {
        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let root_ph = params.push(root_path);
        let prefix_ph = params.push(format!("{root_path}.%"));
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM {} WHERE tenant_id = {tenant_ph} \
             AND (path = {root_ph} OR path LIKE {prefix_ph}) ORDER BY depth ASC",
            self.config.table
        );

        decode_rows(client.query(&sql, params.values()).await?)
    }

    /// Reset-then-aggregate recount of `child_count` for one tenant
    ///
    /// Exact by construction and `O(rows in tenant)`; the incremental
    /// alternative is not implemented.
    pub(crate) async fn recount_children(
        &self,
        client: &dyn MutableTaxonomyClient,
        tenant_id: &str,
    ) -> Result<(), TaxonomyError> {
        let table = &self.config.table;

        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let sql = format!("UPDATE {table} SET child_count = 0 WHERE tenant_id = {tenant_ph}");
        client.execute(&sql, params.values()).await?;

        let mut params = SqlParams::new(self.config.dialect);
        let tenant_ph = params.push(tenant_id);
        let sql = format!(
            "SELECT parent_id, COUNT(*) AS direct_children FROM {table} \
             WHERE tenant_id = {tenant_ph} AND parent_id IS NOT NULL GROUP BY parent_id"
        );
        let outcome = client.query(&sql, params.values()).await?;

        for row in outcome.rows {
            let parent_id = row
                .get("parent_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| TaxonomyError::storage("Aggregate row missing parent_id"))?;
            let count = row
                .get("direct_children")
                .and_then(Value::as_i64)
                .ok_or_else(|| TaxonomyError::storage("Aggregate row missing child count"))?;

            let mut params = SqlParams::new(self.config.dialect);
            let count_ph = params.push(count);
            let tenant_ph = params.push(tenant_id);
            let parent_ph = params.push(parent_id.as_str());
            let sql = format!(
                "UPDATE {table} SET child_count = {count_ph} \
                 WHERE tenant_id = {tenant_ph} AND category_id = {parent_ph}"
            );
            client.execute(&sql, params.values()).await?;
        }

        Ok(())
    }
}

/// New path and depth for one subtree row after the move
///
/// The suffix is the portion of the row's path below the moved node's depth;
/// for the moved node itself that is just its own last segment.
fn rewrite_for_move(
    node: &CategoryRow,
    moved: &CategoryRow,
    new_parent: Option<&CategoryRow>,
) -> (String, i64) {
    let suffix = node
        .path
        .split('.')
        .skip(moved.depth as usize)
        .collect::<Vec<_>>()
        .join(".");
    let depth_delta = node.depth - moved.depth;

    match new_parent {
        Some(parent) => (
            format!("{}.{suffix}", parent.path),
            parent.depth + 1 + depth_delta,
        ),
        None => (suffix, depth_delta),
    }
}

/// Best-effort rollback; the triggering error is the one callers see
pub(crate) async fn attempt_rollback(client: &dyn MutableTaxonomyClient) {
    if let Err(rollback_err) = client.execute("ROLLBACK", &[]).await {
        tracing::warn!("Rollback failed after transaction error: {}", rollback_err);
    }
}
