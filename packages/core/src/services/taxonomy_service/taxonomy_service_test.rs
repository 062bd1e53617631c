//! Unit Tests for TaxonomyService
//!
//! These tests validate SQL generation and error paths for both dialects
//! against scripted client doubles - no real database involved. Emulated
//! end-to-end behavior is covered by the integration suite in `tests/`.

#[cfg(test)]
mod tests {
    use crate::db::{
        Dialect, MutableTaxonomyClient, QueryOutcome, SqlValue, TaxonomyClient,
    };
    use crate::services::error::TaxonomyError;
    use crate::services::taxonomy_service::{AncestorOrder, TaxonomyConfig, TaxonomyService};
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Client double: records every statement, replays scripted query results
    #[derive(Default)]
    struct ScriptedClient {
        queries: Mutex<Vec<(String, Vec<SqlValue>)>>,
        executes: Mutex<Vec<(String, Vec<SqlValue>)>>,
        responses: Mutex<VecDeque<Vec<Value>>>,
    }

    impl ScriptedClient {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn respond_with(&self, rows: Vec<Value>) {
            self.responses.lock().unwrap().push_back(rows);
        }

        fn queries(&self) -> Vec<(String, Vec<SqlValue>)> {
            self.queries.lock().unwrap().clone()
        }

        fn executes(&self) -> Vec<(String, Vec<SqlValue>)> {
            self.executes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaxonomyClient for ScriptedClient {
        async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryOutcome> {
            self.queries
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            let rows = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default();
            let row_count = rows.len();
            Ok(QueryOutcome { rows, row_count })
        }
    }

    #[async_trait]
    impl MutableTaxonomyClient for ScriptedClient {
        async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
            self.executes
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            Ok(1)
        }
    }

    fn category_json(
        category_id: &str,
        parent_id: Option<&str>,
        path: &str,
        depth: i64,
        child_count: i64,
    ) -> Value {
        json!({
            "tenant_id": "acme",
            "category_id": category_id,
            "parent_id": parent_id,
            "identifier": category_id.to_uppercase(),
            "slug": path.rsplit('.').next().unwrap(),
            "name": category_id,
            "path": path,
            "depth": depth,
            "child_count": child_count,
            "mode": "standard",
            "is_selectable": 1,
            "created_at": "2025-01-03 10:00:00",
            "updated_at": "2025-01-03 10:00:00"
        })
    }

    fn config(dialect: Dialect) -> TaxonomyConfig {
        TaxonomyConfig {
            dialect,
            ..TaxonomyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_emulated_subtree_sql() {
        let client = ScriptedClient::new();
        let service = TaxonomyService::new(client.clone(), config(Dialect::Emulated));

        service
            .fetch_subtree("acme", "electronics", None, true)
            .await
            .unwrap();

        let queries = client.queries();
        assert_eq!(queries.len(), 1, "Subtree fetch should be one round trip");
        let (sql, params) = &queries[0];
        assert!(sql.contains("WHERE tenant_id = ?"));
        assert!(sql.contains("(path = ? OR path LIKE ?)"));
        assert!(sql.ends_with("ORDER BY path ASC"));
        assert_eq!(
            params,
            &vec![
                SqlValue::Text("acme".to_string()),
                SqlValue::Text("electronics".to_string()),
                SqlValue::Text("electronics.%".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_emulated_subtree_exclude_root_with_depth_limit() {
        let client = ScriptedClient::new();
        let service = TaxonomyService::new(client.clone(), config(Dialect::Emulated));

        service
            .fetch_subtree("acme", "electronics", Some(1), false)
            .await
            .unwrap();

        let (sql, params) = &client.queries()[0];
        assert!(!sql.contains("path = "), "Root equality arm must be dropped");
        assert!(sql.contains("path LIKE ?"));
        assert!(sql.contains("depth <= ?"));
        // base depth of "electronics" is 0, so the bound is 0 + 1
        assert_eq!(params.last(), Some(&SqlValue::Integer(1)));
    }

    #[tokio::test]
    async fn test_emulated_subtree_normalizes_path_input() {
        let client = ScriptedClient::new();
        let service = TaxonomyService::new(client.clone(), config(Dialect::Emulated));

        service
            .fetch_subtree("acme", "electronics/mobile", None, true)
            .await
            .unwrap();

        let (_, params) = &client.queries()[0];
        assert_eq!(params[1], SqlValue::Text("electronics.mobile".to_string()));
    }

    #[tokio::test]
    async fn test_hierarchical_subtree_sql() {
        let client = ScriptedClient::new();
        let service = TaxonomyService::new(client.clone(), config(Dialect::Hierarchical));

        service
            .fetch_subtree("acme", "electronics", None, false)
            .await
            .unwrap();

        let (sql, params) = &client.queries()[0];
        assert!(sql.contains("WHERE tenant_id = $1"));
        assert!(sql.contains("path <@ $2::ltree"));
        assert!(sql.contains("path <> $3::ltree"));
        assert_eq!(params.len(), 3);
    }

    #[tokio::test]
    async fn test_hierarchical_ancestors_single_query() {
        let client = ScriptedClient::new();
        client.respond_with(vec![
            category_json("cat-mobile", Some("cat-electronics"), "electronics.mobile", 1, 1),
            category_json("cat-electronics", None, "electronics", 0, 1),
        ]);
        let service = TaxonomyService::new(client.clone(), config(Dialect::Hierarchical));

        let rows = service
            .fetch_ancestors("acme", "cat-android", false, AncestorOrder::Descending)
            .await
            .unwrap();

        let queries = client.queries();
        assert_eq!(queries.len(), 1, "Hierarchical lookup is one query");
        let (sql, params) = &queries[0];
        assert!(sql.contains("c.path @> t.path"));
        assert!(sql.contains("c.category_id <> t.category_id"));
        assert!(sql.ends_with("ORDER BY c.depth DESC"));
        assert_eq!(
            params,
            &vec![
                SqlValue::Text("cat-android".to_string()),
                SqlValue::Text("acme".to_string()),
            ]
        );
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_emulated_ancestors_two_round_trips() {
        let client = ScriptedClient::new();
        client.respond_with(vec![json!({"path": "electronics.mobile.android"})]);
        client.respond_with(vec![
            category_json("cat-mobile", Some("cat-electronics"), "electronics.mobile", 1, 1),
            category_json("cat-electronics", None, "electronics", 0, 1),
        ]);
        let service = TaxonomyService::new(client.clone(), config(Dialect::Emulated));

        let rows = service
            .fetch_ancestors("acme", "cat-android", false, AncestorOrder::Descending)
            .await
            .unwrap();

        let queries = client.queries();
        assert_eq!(queries.len(), 2, "Emulation needs two round trips");

        let (first_sql, first_params) = &queries[0];
        assert!(first_sql.contains("SELECT path FROM"));
        assert_eq!(first_params.len(), 2);

        let (second_sql, second_params) = &queries[1];
        assert!(second_sql.contains("? LIKE path || '.%'"));
        assert!(second_sql.ends_with("ORDER BY depth DESC"));
        assert_eq!(
            second_params,
            &vec![
                SqlValue::Text("acme".to_string()),
                SqlValue::Text("electronics.mobile.android".to_string()),
            ]
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].path, "electronics.mobile");
        assert_eq!(rows[1].path, "electronics");
    }

    #[tokio::test]
    async fn test_emulated_ancestors_missing_target_returns_empty() {
        let client = ScriptedClient::new();
        let service = TaxonomyService::new(client.clone(), config(Dialect::Emulated));

        let rows = service
            .fetch_ancestors("acme", "cat-ghost", true, AncestorOrder::Ascending)
            .await
            .unwrap();

        assert!(rows.is_empty());
        assert_eq!(
            client.queries().len(),
            1,
            "Missing target must short-circuit before the second round trip"
        );
    }

    #[tokio::test]
    async fn test_reparent_requires_mutation_capability() {
        let client = ScriptedClient::new();
        let service = TaxonomyService::new(client.clone(), config(Dialect::Emulated));

        let err = service
            .reparent_subtree("acme", "cat-mobile", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, TaxonomyError::Transaction { .. }));
        assert!(client.executes().is_empty(), "No statement may be issued");
    }

    #[tokio::test]
    async fn test_hierarchical_reparent_delegates_to_procedure() {
        let client = ScriptedClient::new();
        client.respond_with(vec![json!({"moved": 2})]);
        let service = TaxonomyService::new(client.clone(), config(Dialect::Hierarchical));

        let moved = service
            .reparent_subtree("acme", "cat-mobile", None, Some("ops@acme"))
            .await
            .unwrap();

        assert_eq!(moved, 2);
        let queries = client.queries();
        assert_eq!(queries.len(), 1);
        let (sql, params) = &queries[0];
        assert_eq!(
            sql,
            "SELECT reparent_category_subtree($1, $2, $3, $4) AS moved"
        );
        assert_eq!(
            params,
            &vec![
                SqlValue::Text("acme".to_string()),
                SqlValue::Text("cat-mobile".to_string()),
                SqlValue::Null,
                SqlValue::Text("ops@acme".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_emulated_reparent_cycle_rolls_back_without_writes() {
        let client = ScriptedClient::new();
        // Step 1: the moved node
        client.respond_with(vec![category_json(
            "cat-mobile",
            Some("cat-electronics"),
            "electronics.mobile",
            1,
            1,
        )]);
        // Step 2: the requested parent is inside the moved subtree
        client.respond_with(vec![category_json(
            "cat-android",
            Some("cat-mobile"),
            "electronics.mobile.android",
            2,
            0,
        )]);
        let service = TaxonomyService::with_mutations(client.clone(), config(Dialect::Emulated));

        let err = service
            .reparent_subtree("acme", "cat-mobile", Some("cat-android"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, TaxonomyError::Cycle { .. }));
        let executes = client.executes();
        let statements: Vec<&str> = executes.iter().map(|(sql, _)| sql.as_str()).collect();
        assert_eq!(
            statements,
            vec!["BEGIN", "ROLLBACK"],
            "Cycle detection must precede every write"
        );
    }

    #[tokio::test]
    async fn test_validation_rejects_empty_identifiers() {
        let client = ScriptedClient::new();
        let service = TaxonomyService::new(client.clone(), config(Dialect::Emulated));

        let err = service.fetch_subtree("", "electronics", None, true).await;
        assert!(matches!(err, Err(TaxonomyError::Validation(_))));

        let err = service.fetch_subtree("acme", "  ", None, true).await;
        assert!(matches!(err, Err(TaxonomyError::Validation(_))));

        let err = service
            .fetch_ancestors("acme", "", true, AncestorOrder::Ascending)
            .await;
        assert!(matches!(err, Err(TaxonomyError::Validation(_))));

        let err = service.reparent_subtree("acme", " ", None, None).await;
        assert!(matches!(err, Err(TaxonomyError::Validation(_))));

        assert!(client.queries().is_empty(), "Validation precedes SQL");
    }
}
