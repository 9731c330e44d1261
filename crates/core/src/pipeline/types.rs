//! Types for the acquisition pipeline.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::provider::ProviderError;
use crate::store::{Book, Category, StoreError};

/// Errors surfaced by pipeline operations.
///
/// Transport and empty-upstream failures are recovered locally wherever a
/// cached result exists; storage failures are fatal for the refresh attempt
/// (the store's prior committed state stays valid).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upstream unreachable or returned a failure status.
    #[error("Upstream transport failure: {0}")]
    Transport(#[from] ProviderError),

    /// Upstream call succeeded but produced zero usable items.
    #[error("Upstream returned no usable results")]
    EmptyUpstream,

    /// Persistence layer failure.
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// A category together with its cached ordered book list.
#[derive(Debug, Clone)]
pub struct CategoryWithBooks {
    pub category: Category,
    pub books: Vec<Book>,
}

/// Cache-first read of all categories.
///
/// `categories` is the immediate snapshot; when any category was stale or
/// empty, `updates` delivers one message per category that commits fresh
/// data. Callers must tolerate receiving both the snapshot and the later
/// updates for the same category.
pub struct CategoriesSnapshot {
    pub categories: Vec<CategoryWithBooks>,
    pub updates: Option<mpsc::Receiver<CategoryUpdate>>,
}

/// A committed refresh result delivered after the initial snapshot.
#[derive(Debug, Clone)]
pub struct CategoryUpdate {
    pub category_id: i64,
    pub books: Vec<Book>,
}

/// Cache-first read of a single category. `update` resolves only if a
/// triggered refresh commits; a dropped sender means nothing changed.
pub struct CategoryRead {
    pub category: Category,
    pub books: Vec<Book>,
    pub update: Option<oneshot::Receiver<CategoryUpdate>>,
}
