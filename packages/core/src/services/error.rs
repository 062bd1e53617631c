//! Service Layer Error Types
//!
//! High-level error taxonomy for taxonomy-engine operations. Driver errors
//! cross the client boundary as `anyhow::Error` and surface unchanged in
//! the `Storage` variant.

use crate::models::ValidationError;
use thiserror::Error;

/// Taxonomy operation errors
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// Malformed path input or missing required identifier
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced category or parent does not exist for the tenant
    #[error("Category not found: {category_id} (tenant {tenant_id})")]
    NotFound {
        tenant_id: String,
        category_id: String,
    },

    /// Requested reparent would make a node its own ancestor
    #[error("Reparent would create a cycle: {context}")]
    Cycle { context: String },

    /// Mutation requested against a service without mutation capability
    #[error("Transaction unavailable: {context}")]
    Transaction { context: String },

    /// Underlying driver/transport failure, surfaced as-is
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl TaxonomyError {
    /// Create a not found error
    pub fn not_found(tenant_id: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self::NotFound {
            tenant_id: tenant_id.into(),
            category_id: category_id.into(),
        }
    }

    /// Create a cycle error
    pub fn cycle(context: impl Into<String>) -> Self {
        Self::Cycle {
            context: context.into(),
        }
    }

    /// Create a transaction error
    pub fn transaction(context: impl Into<String>) -> Self {
        Self::Transaction {
            context: context.into(),
        }
    }

    /// Create a storage error from a message
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(anyhow::anyhow!(msg.into()))
    }
}
