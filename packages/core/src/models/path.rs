//! Materialized Path Handling
//!
//! Canonical dot-joined paths encode a category's full ancestor chain
//! (e.g. `electronics.mobile.android`). This module owns normalization of
//! caller-supplied path input and the small pure helpers the query and
//! reparent code build on.
//!
//! # Examples
//!
//! ```rust
//! use taxonomy_core::models::build_path;
//!
//! assert_eq!(build_path("electronics/mobile").unwrap(), "electronics.mobile");
//! assert_eq!(build_path(vec!["electronics", "mobile"]).unwrap(), "electronics.mobile");
//! ```

use thiserror::Error;

/// Validation errors for path and identifier input
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Path has no usable segments")]
    EmptyPath,

    #[error("Invalid path segment: {0}")]
    InvalidSegment(String),

    #[error("Duplicate category: {0}")]
    Duplicate(String),
}

/// Raw path input accepted by [`build_path`]
///
/// Callers hold either a pre-joined string (`"a.b.c"`, legacy `/`-separated
/// forms included) or an ordered list of segments. Both shapes normalize to
/// the same canonical path.
#[derive(Debug, Clone)]
pub enum PathInput {
    Raw(String),
    Segments(Vec<String>),
}

impl From<&str> for PathInput {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<String> for PathInput {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<Vec<String>> for PathInput {
    fn from(segments: Vec<String>) -> Self {
        Self::Segments(segments)
    }
}

impl From<Vec<&str>> for PathInput {
    fn from(segments: Vec<&str>) -> Self {
        Self::Segments(segments.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for PathInput {
    fn from(segments: &[&str]) -> Self {
        Self::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

/// Normalize raw input into a canonical dot-joined path
///
/// String input is split on `.` or `/`; every segment is trimmed and empty
/// segments are dropped. List input is trimmed the same way. An input with
/// no surviving segments is rejected.
///
/// Pure and deterministic: `build_path("a.b") == build_path(vec!["a", "b"])`.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyPath`] if no non-empty segment remains.
pub fn build_path(input: impl Into<PathInput>) -> Result<String, ValidationError> {
    let segments: Vec<String> = match input.into() {
        PathInput::Raw(raw) => raw
            .split(['.', '/'])
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        PathInput::Segments(list) => list
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    };

    if segments.is_empty() {
        return Err(ValidationError::EmptyPath);
    }

    Ok(segments.join("."))
}

/// Number of segments in a canonical path
///
/// For rows satisfying the depth invariant, `depth == segment_count(path) - 1`.
pub fn segment_count(path: &str) -> usize {
    path.split('.').filter(|s| !s.is_empty()).count()
}

/// Whether `candidate` equals `root` or lives anywhere inside its subtree
///
/// String form of the containment test the emulated dialect uses in SQL
/// (`path = root OR path LIKE root || '.%'`); shared by the reparent cycle
/// check.
pub fn is_self_or_descendant(candidate: &str, root: &str) -> bool {
    candidate == root || candidate.starts_with(&format!("{root}."))
}

/// Normalize a slug into a single path segment
///
/// Slugs become one segment of a materialized path, so separator characters
/// are rejected rather than silently splitting the path.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidSegment`] for empty slugs or slugs
/// containing `.` or `/`.
pub fn normalize_slug(slug: &str) -> Result<String, ValidationError> {
    let trimmed = slug.trim();
    if trimmed.is_empty() || trimmed.contains(['.', '/']) {
        return Err(ValidationError::InvalidSegment(slug.to_string()));
    }
    Ok(trimmed.to_string())
}
