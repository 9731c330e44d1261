//! External book search provider boundary.
//!
//! The pipeline only ever talks to the `BookProvider` trait: one search call
//! per page, one detail call per volume. The bundled implementation speaks
//! the Google Books volumes API; tests use `testing::MockProvider`.

mod google_books;
mod types;

pub use google_books::{GoogleBooksConfig, GoogleBooksProvider};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a search provider. All of them count as upstream
/// transport failures for the pipeline's degradation policy.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to decode a response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Trait for book search backends.
#[async_trait]
pub trait BookProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Execute one search call for up to one page of candidates.
    ///
    /// Implementations apply the fixed upstream defaults (language, country,
    /// print type, ordering, page size); `start_index` selects the page.
    async fn search(&self, query: &str, start_index: u32) -> Result<SearchPage, ProviderError>;

    /// Fetch the full record of a single volume, used to fill in fields the
    /// search listing omitted.
    async fn volume_details(&self, volume_id: &str) -> Result<BookCandidate, ProviderError>;
}
