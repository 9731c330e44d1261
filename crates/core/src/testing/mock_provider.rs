//! Mock book provider for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::provider::{BookCandidate, BookProvider, ProviderError, SearchPage};
use crate::query::DEFAULT_MAX_RESULTS;

/// A recorded search call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub query: String,
    pub start_index: u32,
}

/// Mock implementation of the [`BookProvider`] trait.
///
/// Results are configured per exact query string and served page by page
/// (40 per page), so pagination and primary/fallback query routing can be
/// asserted. Failures can be injected globally (next call) or per
/// query/page and per volume id.
pub struct MockProvider {
    results: Arc<RwLock<HashMap<String, Vec<BookCandidate>>>>,
    detail_descriptions: Arc<RwLock<HashMap<String, String>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    detail_calls: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<ProviderError>>>,
    failing_pages: Arc<RwLock<HashSet<(String, u32)>>>,
    failing_details: Arc<RwLock<HashSet<String>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(HashMap::new())),
            detail_descriptions: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            detail_calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failing_pages: Arc::new(RwLock::new(HashSet::new())),
            failing_details: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Set the full result list for an exact query string. Pages are cut
    /// from this list by `start_index`.
    pub async fn set_results(&self, query: &str, candidates: Vec<BookCandidate>) {
        self.results
            .write()
            .await
            .insert(query.to_string(), candidates);
    }

    /// Set the description a detail call for `volume_id` returns.
    pub async fn set_detail_description(&self, volume_id: &str, description: &str) {
        self.detail_descriptions
            .write()
            .await
            .insert(volume_id.to_string(), description.to_string());
    }

    /// Fail the next search call with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every search for this exact query/page combination.
    pub async fn fail_page(&self, query: &str, start_index: u32) {
        self.failing_pages
            .write()
            .await
            .insert((query.to_string(), start_index));
    }

    /// Fail every detail call for this volume id.
    pub async fn fail_detail(&self, volume_id: &str) {
        self.failing_details
            .write()
            .await
            .insert(volume_id.to_string());
    }

    /// All recorded search calls, in order.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// All recorded detail calls, in order.
    pub async fn recorded_detail_calls(&self) -> Vec<String> {
        self.detail_calls.read().await.clone()
    }

    pub async fn detail_call_count(&self) -> usize {
        self.detail_calls.read().await.len()
    }

    fn injected_failure() -> ProviderError {
        ProviderError::Api {
            status: 503,
            message: "injected failure".to_string(),
        }
    }
}

#[async_trait]
impl BookProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str, start_index: u32) -> Result<SearchPage, ProviderError> {
        self.searches.write().await.push(RecordedSearch {
            query: query.to_string(),
            start_index,
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if self
            .failing_pages
            .read()
            .await
            .contains(&(query.to_string(), start_index))
        {
            return Err(Self::injected_failure());
        }

        let results = self.results.read().await;
        let all = results.get(query).cloned().unwrap_or_default();
        let total_items = all.len() as u32;

        let candidates = all
            .into_iter()
            .skip(start_index as usize)
            .take(DEFAULT_MAX_RESULTS as usize)
            .collect();

        Ok(SearchPage {
            candidates,
            total_items,
        })
    }

    async fn volume_details(&self, volume_id: &str) -> Result<BookCandidate, ProviderError> {
        self.detail_calls.write().await.push(volume_id.to_string());

        if self.failing_details.read().await.contains(volume_id) {
            return Err(Self::injected_failure());
        }

        let description = self.detail_descriptions.read().await.get(volume_id).cloned();
        Ok(BookCandidate {
            id: volume_id.to_string(),
            title: String::new(),
            author: None,
            cover_url: None,
            description,
            published_date: None,
            ratings_count: None,
            average_rating: None,
        })
    }
}
