//! Dialect Strategy and Parameter Binding
//!
//! Two interchangeable query-construction strategies share the service's
//! public API:
//!
//! - **Hierarchical** - the backend has a native hierarchical column type
//!   (PostgreSQL `ltree`): containment operators in WHERE clauses, `$n`
//!   placeholders, and a server-side procedure for subtree reparenting.
//! - **Emulated** - plain string storage: `LIKE` prefix matching, `?`
//!   placeholders, and manual transactional bookkeeping for reparents.
//!
//! [`SqlParams`] keeps placeholder rendering and value collection in one
//! place: every `push` records the value and hands back the placeholder text
//! for the active dialect, so statement assembly never tracks indices by
//! hand.

use serde::{Deserialize, Serialize};

use crate::db::client::SqlValue;

/// Query-construction strategy for the target backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Native hierarchical containment operators, `$n` placeholders.
    Hierarchical,
    /// LIKE/string-prefix emulation, `?` placeholders.
    #[default]
    Emulated,
}

impl Dialect {
    /// Render the placeholder for the 1-based parameter position
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::Hierarchical => format!("${position}"),
            Self::Emulated => "?".to_string(),
        }
    }
}

/// Parameter binder for one SQL statement
///
/// # Examples
///
/// ```rust
/// use taxonomy_core::db::{Dialect, SqlParams};
///
/// let mut params = SqlParams::new(Dialect::Hierarchical);
/// let tenant = params.push("acme");
/// let depth = params.push(3_i64);
/// assert_eq!((tenant.as_str(), depth.as_str()), ("$1", "$2"));
/// assert_eq!(params.values().len(), 2);
/// ```
#[derive(Debug)]
pub struct SqlParams {
    dialect: Dialect,
    values: Vec<SqlValue>,
}

impl SqlParams {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    /// Record a value and return its rendered placeholder
    ///
    /// Values must be pushed in the order their placeholders appear in the
    /// statement text; the emulated dialect binds positionally.
    pub fn push(&mut self, value: impl Into<SqlValue>) -> String {
        self.values.push(value.into());
        self.dialect.placeholder(self.values.len())
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchical_placeholders_are_numbered() {
        let mut params = SqlParams::new(Dialect::Hierarchical);
        assert_eq!(params.push("a"), "$1");
        assert_eq!(params.push("b"), "$2");
        assert_eq!(params.push(7_i64), "$3");
    }

    #[test]
    fn test_emulated_placeholders_are_positional() {
        let mut params = SqlParams::new(Dialect::Emulated);
        assert_eq!(params.push("a"), "?");
        assert_eq!(params.push("b"), "?");
        assert_eq!(params.values().len(), 2);
    }

    #[test]
    fn test_values_preserve_push_order() {
        let mut params = SqlParams::new(Dialect::Emulated);
        params.push("tenant");
        params.push(2_i64);
        params.push(Option::<&str>::None);
        assert_eq!(
            params.values(),
            &[
                SqlValue::Text("tenant".to_string()),
                SqlValue::Integer(2),
                SqlValue::Null,
            ]
        );
    }

    #[test]
    fn test_dialect_deserializes_from_config_strings() {
        assert_eq!(
            serde_json::from_str::<Dialect>("\"hierarchical\"").unwrap(),
            Dialect::Hierarchical
        );
        assert_eq!(
            serde_json::from_str::<Dialect>("\"emulated\"").unwrap(),
            Dialect::Emulated
        );
    }
}
