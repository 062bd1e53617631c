//! Database Layer
//!
//! This module owns everything between the service layer and the database
//! driver:
//!
//! - Client capability traits (read vs. mutation access)
//! - Dialect strategy and parameter binding
//! - The bundled libsql client (embedded backend, emulated dialect)
//!
//! Connection pooling and transports belong to client implementations, not
//! to this crate.

mod client;
mod dialect;
mod error;
mod libsql_client;

pub use client::{MutableTaxonomyClient, QueryOutcome, SqlValue, TaxonomyClient};
pub use dialect::{Dialect, SqlParams};
pub use error::DatabaseError;
pub use libsql_client::LibsqlClient;
