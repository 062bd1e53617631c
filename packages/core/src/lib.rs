//! Taxonomy Core
//!
//! Multi-tenant hierarchical classification storage over a materialized-path
//! model: dot-separated path strings with denormalized depth and child
//! counts, queried through either a native hierarchical dialect (PostgreSQL
//! `ltree`-style containment) or a LIKE-based string emulation.
//!
//! # Architecture
//!
//! - **Client-supplied storage**: the engine builds SQL and decodes rows;
//!   connections and transports belong to the caller's client
//! - **Dual dialect**: one public API, two query-construction strategies
//! - **Hand-run reparenting**: the emulated dialect rewrites whole subtrees
//!   (paths, depths, child counts) inside one explicit transaction
//!
//! # Modules
//!
//! - [`models`] - CategoryRow, path normalization, timestamp parsing
//! - [`db`] - client traits, dialect strategy, bundled libsql backend
//! - [`services`] - TaxonomyService and the service error taxonomy

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::*;
pub use models::*;
pub use services::*;
