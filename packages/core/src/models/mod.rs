//! Data Models
//!
//! Core data structures for the taxonomy engine:
//!
//! - `CategoryRow` - one tenant-scoped taxonomy node with its materialized path
//! - Path normalization and the pure helpers built on it
//! - Timestamp parsing shared by row decoding

mod category;
pub mod path;
pub mod time;

pub use category::CategoryRow;
pub use path::{
    build_path, is_self_or_descendant, normalize_slug, segment_count, PathInput, ValidationError,
};
