//! Business Services
//!
//! Service layer for the taxonomy engine:
//!
//! - `TaxonomyService` - subtree/ancestor queries, subtree reparenting, and
//!   category creation over a caller-supplied database client
//!
//! Services coordinate between the database layer and application logic;
//! tenancy resolution and request parsing belong to upstream collaborators.

pub mod error;
pub mod taxonomy_service;

pub use error::TaxonomyError;
pub use taxonomy_service::{
    AncestorOrder, CreateCategoryParams, TaxonomyConfig, TaxonomyService,
};
