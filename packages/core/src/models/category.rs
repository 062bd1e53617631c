//! Category Row Model
//!
//! One taxonomy node for one tenant. The materialized path encodes the full
//! ancestor chain; `depth` and `child_count` are denormalized alongside it
//! and kept consistent by the service layer:
//!
//! - `depth == segment_count(path) - 1` for every row
//! - `child_count` equals the number of rows whose `parent_id` points at
//!   this row, within the same tenant
//! - `tenant_id` scopes every read and write; rows never cross tenants
//!
//! Rows cross the client boundary as JSON objects keyed by column name and
//! decode through serde here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::time::deserialize_timestamp;

/// One taxonomy node for one tenant
///
/// `mode` and `is_selectable` are opaque policy flags owned by upstream
/// configuration; the engine passes them through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub tenant_id: String,
    pub category_id: String,
    /// Back-reference to the parent row; `None` marks a root category.
    pub parent_id: Option<String>,
    pub identifier: String,
    pub slug: String,
    pub name: String,
    /// Canonical dot-joined ancestor chain ending in this node's own segment.
    pub path: String,
    pub depth: i64,
    pub child_count: i64,
    pub mode: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_selectable: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Decode a boolean column that SQLite surfaces as 0/1
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        other => Err(serde::de::Error::custom(format!(
            "expected boolean flag, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row_json() -> Value {
        json!({
            "tenant_id": "acme",
            "category_id": "cat-1",
            "parent_id": null,
            "identifier": "ELECTRONICS",
            "slug": "electronics",
            "name": "Electronics",
            "path": "electronics",
            "depth": 0,
            "child_count": 2,
            "mode": "standard",
            "is_selectable": 1,
            "created_at": "2025-01-03 10:30:00",
            "updated_at": "2025-01-03T11:00:00Z"
        })
    }

    #[test]
    fn test_decode_from_row_json() {
        let row: CategoryRow = serde_json::from_value(row_json()).unwrap();
        assert_eq!(row.tenant_id, "acme");
        assert_eq!(row.parent_id, None);
        assert_eq!(row.depth, 0);
        assert_eq!(row.child_count, 2);
        assert!(row.is_selectable);
    }

    #[test]
    fn test_decode_boolean_flag_variants() {
        let mut json = row_json();
        json["is_selectable"] = Value::Bool(false);
        let row: CategoryRow = serde_json::from_value(json).unwrap();
        assert!(!row.is_selectable);

        let mut json = row_json();
        json["is_selectable"] = json!(0);
        let row: CategoryRow = serde_json::from_value(json).unwrap();
        assert!(!row.is_selectable);
    }

    #[test]
    fn test_decode_rejects_bad_timestamp() {
        let mut json = row_json();
        json["created_at"] = json!("yesterday-ish");
        assert!(serde_json::from_value::<CategoryRow>(json).is_err());
    }
}
