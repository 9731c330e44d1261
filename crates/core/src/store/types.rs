//! Types for the book catalog store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel the upstream API uses when it has no author information.
/// Treated as "no author" everywhere in the engine.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// A canonical book record.
///
/// Identity is the upstream volume id. Content fields are overwritten
/// wholesale on upsert; `last_opened_at` moves independently of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Stable upstream identifier (primary key).
    pub id: String,
    /// Title. A record with an empty/whitespace title is never persisted.
    pub title: String,
    /// Author(s), joined with ", ". `None` covers the "Unknown Author" case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Cover image URL (https only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Partial-precision date: `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    /// Epoch millis of the last content write.
    pub fetched_at: i64,
    /// Epoch millis of the last read-for-display, 0 = never opened.
    #[serde(default)]
    pub last_opened_at: i64,
}

/// A home-screen category with an upstream query hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Store-local id, auto-assigned on insert.
    pub id: i64,
    /// Unique display name.
    pub name: String,
    /// Upstream query fragment, e.g. `subject:romance`.
    pub query_hint: String,
    /// Epoch millis of the last successful refresh, 0 = never fetched.
    pub fetched_at: i64,
}

/// Errors for catalog store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}
