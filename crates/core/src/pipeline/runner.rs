//! The acquisition pipeline.
//!
//! Orchestrates: cache lookup -> staleness check -> upstream search ->
//! basic filter -> rank -> budgeted detail enrichment -> completeness
//! filter -> re-rank -> truncate -> cache write -> result delivery.
//! Every refresh degrades to existing cached data on upstream failure.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::provider::{BookCandidate, BookProvider};
use crate::quality::{has_basic_fields, is_complete, language_admissible, rank_by_quality};
use crate::query;
use crate::store::{Book, CatalogStore, Category};

use super::config::PipelineConfig;
use super::types::{
    CategoriesSnapshot, CategoryRead, CategoryUpdate, CategoryWithBooks, PipelineError,
};

/// Categories seeded on first run.
const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Romance", "subject:romance"),
    ("Science Fiction", "subject:science fiction"),
    ("Non-fiction", "subject:nonfiction"),
    ("Self Development", "subject:self-help"),
];

/// A refresh target: one category or one normalized search query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RefreshTarget {
    Category(i64),
    Query(String),
}

/// The catalog acquisition pipeline.
///
/// Cheap to clone; clones share the in-flight bookkeeping, so one logical
/// writer per refresh target holds across the whole instance. The pipeline
/// itself keeps only transient, request-scoped candidate lists; all
/// persisted state is owned by the injected store.
#[derive(Clone)]
pub struct AcquisitionPipeline {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn BookProvider>,
    config: PipelineConfig,
    in_flight: Mutex<HashSet<RefreshTarget>>,
}

/// Removes its target from the in-flight set when the refresh ends,
/// committed or not.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<RefreshTarget>>,
    target: RefreshTarget,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.target);
    }
}

impl AcquisitionPipeline {
    /// Create a pipeline over the given store and provider.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        provider: Arc<dyn BookProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                provider,
                config,
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Seed the fixed bootstrap categories iff none exist yet.
    pub fn seed_categories(&self) -> Result<(), PipelineError> {
        if !self.inner.store.categories()?.is_empty() {
            return Ok(());
        }
        for (name, query_hint) in DEFAULT_CATEGORIES {
            self.inner.store.insert_category(name, query_hint)?;
        }
        info!("seeded {} default categories", DEFAULT_CATEGORIES.len());
        Ok(())
    }

    /// Run one refresh pass for a category.
    ///
    /// `Ok(None)` means nothing was committed (empty query hint, refresh
    /// already in flight, or zero complete candidates) and the existing
    /// cache plus `fetched_at` are untouched. `Ok(Some(books))` is the new
    /// committed ordered list.
    pub async fn refresh_category(
        &self,
        category: &Category,
    ) -> Result<Option<Vec<Book>>, PipelineError> {
        self.inner.refresh_category(category).await
    }

    /// Refresh every category, strictly one after another. Transport
    /// failures degrade to the existing cache per category; storage
    /// failures abort. Returns the number of categories that committed.
    pub async fn refresh_all_categories(&self) -> Result<u32, PipelineError> {
        let categories = self.inner.store.categories()?;
        let mut committed = 0;
        for category in categories {
            match self.inner.refresh_category(&category).await {
                Ok(Some(_)) => committed += 1,
                Ok(None) => {}
                Err(PipelineError::Storage(e)) => return Err(PipelineError::Storage(e)),
                Err(e) => warn!(
                    "category '{}' refresh degraded to cache: {}",
                    category.name, e
                ),
            }
        }
        Ok(committed)
    }

    /// Cache-first read of all categories.
    ///
    /// Returns the cached snapshot immediately. Categories that are stale
    /// (older than the TTL) or empty are refreshed sequentially on a
    /// background task; each committed refresh is delivered on the
    /// `updates` channel as a second delivery.
    pub async fn get_categories(&self) -> Result<CategoriesSnapshot, PipelineError> {
        let categories = self.inner.store.categories()?;

        let mut entries = Vec::with_capacity(categories.len());
        let mut needs_refresh = Vec::new();
        for category in categories {
            let books = self.inner.store.get_category_books(category.id)?;
            // Per-item `now`: the TTL is coarse, each category samples its
            // own clock.
            let now = now_millis();
            if now - category.fetched_at > self.inner.config.cache_ttl_ms || books.is_empty() {
                needs_refresh.push(category.clone());
            }
            entries.push(CategoryWithBooks { category, books });
        }

        let updates = if needs_refresh.is_empty() {
            None
        } else {
            let (tx, rx) = mpsc::channel(needs_refresh.len());
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                for category in needs_refresh {
                    if let Some(books) = inner.refresh_category_logged(&category).await {
                        let update = CategoryUpdate {
                            category_id: category.id,
                            books,
                        };
                        // A closed receiver just means the caller lost
                        // interest; the cache write already happened.
                        let _ = tx.send(update).await;
                    }
                }
            });
            Some(rx)
        };

        Ok(CategoriesSnapshot {
            categories: entries,
            updates,
        })
    }

    /// Cache-first read of a single category, with the same second-delivery
    /// contract as [`get_categories`](Self::get_categories).
    pub async fn read_category(
        &self,
        category_id: i64,
    ) -> Result<Option<CategoryRead>, PipelineError> {
        let Some(category) = self.inner.store.get_category(category_id)? else {
            return Ok(None);
        };
        let books = self.inner.store.get_category_books(category_id)?;

        let now = now_millis();
        let stale = now - category.fetched_at > self.inner.config.cache_ttl_ms;

        let update = if stale || books.is_empty() {
            let (tx, rx) = oneshot::channel();
            let inner = Arc::clone(&self.inner);
            let category = category.clone();
            tokio::spawn(async move {
                if let Some(books) = inner.refresh_category_logged(&category).await {
                    let _ = tx.send(CategoryUpdate {
                        category_id: category.id,
                        books,
                    });
                }
            });
            Some(rx)
        } else {
            None
        };

        Ok(Some(CategoryRead {
            category,
            books,
            update,
        }))
    }

    /// Search books, offline-first.
    ///
    /// Fresh cache entries are served without any upstream call. On a
    /// refresh, the strict title query runs first and the loose fallback
    /// replaces it when it under-returns. An empty final set falls back to
    /// whatever is cached, even stale; a transport failure with nothing
    /// cached surfaces as an error.
    pub async fn search(&self, raw_query: &str) -> Result<Vec<Book>, PipelineError> {
        self.inner.search(raw_query).await
    }

    /// Read a book for display, bumping its last-opened timestamp.
    pub async fn open_book(&self, id: &str) -> Result<Option<Book>, PipelineError> {
        let Some(mut book) = self.inner.store.get_book(id)? else {
            return Ok(None);
        };
        let now = now_millis();
        self.inner.store.touch_last_opened(id, now)?;
        book.last_opened_at = now;
        Ok(Some(book))
    }
}

impl Inner {
    /// Claim a refresh target, or `None` if a refresh for it is in flight.
    fn begin(&self, target: RefreshTarget) -> Option<InFlightGuard<'_>> {
        let mut set = self.in_flight.lock().unwrap();
        if !set.insert(target.clone()) {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            target,
        })
    }

    /// Background-task wrapper: commit result or log-and-degrade.
    async fn refresh_category_logged(&self, category: &Category) -> Option<Vec<Book>> {
        match self.refresh_category(category).await {
            Ok(committed) => committed,
            Err(PipelineError::Storage(e)) => {
                error!(
                    "category '{}' refresh failed in storage: {}",
                    category.name, e
                );
                None
            }
            Err(e) => {
                warn!(
                    "category '{}' refresh degraded to cache: {}",
                    category.name, e
                );
                None
            }
        }
    }

    async fn refresh_category(
        &self,
        category: &Category,
    ) -> Result<Option<Vec<Book>>, PipelineError> {
        let search_query = query::build_category_query(&category.query_hint);
        if search_query.is_empty() {
            debug!(
                "category '{}' has an empty query hint, skipping refresh",
                category.name
            );
            return Ok(None);
        }

        let Some(_guard) = self.begin(RefreshTarget::Category(category.id)) else {
            debug!("category '{}' refresh already in flight", category.name);
            return Ok(None);
        };

        // Page 1, then page 2 unless the first already filled a full page
        // worth of candidates. A page-2 failure is non-fatal.
        let mut candidates = self.provider.search(&search_query, 0).await?.candidates;
        if candidates.len() < query::DEFAULT_MAX_RESULTS as usize {
            match self
                .provider
                .search(&search_query, query::DEFAULT_MAX_RESULTS)
                .await
            {
                Ok(page) => candidates.extend(page.candidates),
                Err(e) => warn!(
                    "category '{}': second page fetch failed: {}",
                    category.name, e
                ),
            }
        }
        debug!(
            "category '{}': {} candidates fetched",
            category.name,
            candidates.len()
        );

        // Cheap admissibility plus the non-English heuristic, then rank so
        // the detail-call budget goes to the best candidates first.
        candidates.retain(|c| has_basic_fields(c) && language_admissible(c));
        rank_by_quality(&mut candidates);

        let mut complete = self
            .enrich_and_collect(
                candidates,
                self.config.category_detail_budget,
                self.config.category_target_complete,
            )
            .await;

        // Enrichment can change the comparator outcome.
        rank_by_quality(&mut complete);
        complete.truncate(self.config.category_target_complete);

        if complete.is_empty() {
            // A transient empty result must not erase a previously good cache.
            info!(
                "category '{}': no complete candidates, keeping existing cache",
                category.name
            );
            return Ok(None);
        }

        let now = now_millis();
        let ids: Vec<String> = complete.iter().map(|c| c.id.clone()).collect();
        for candidate in complete {
            self.store.upsert_book(&candidate.into_book(now))?;
        }
        self.store.replace_category_books(category.id, &ids)?;
        self.store.set_category_fetched_at(category.id, now)?;

        let books = self.store.get_category_books(category.id)?;
        info!(
            "category '{}': committed {} books",
            category.name,
            books.len()
        );
        Ok(Some(books))
    }

    async fn search(&self, raw_query: &str) -> Result<Vec<Book>, PipelineError> {
        let original = raw_query.trim();
        if original.is_empty() {
            return Ok(Vec::new());
        }
        let normalized = original.to_lowercase();

        let now = now_millis();
        let fetched_at = self.store.get_search_cache_fetched_at(&normalized)?;
        if fetched_at > 0 && now - fetched_at < self.config.cache_ttl_ms {
            debug!("search '{}': serving fresh cache", normalized);
            return Ok(self.store.get_search_cache_books(&normalized)?);
        }

        let Some(_guard) = self.begin(RefreshTarget::Query(normalized.clone())) else {
            // Another refresh owns this target; serve the current snapshot.
            debug!("search '{}': refresh already in flight", normalized);
            return Ok(self.store.get_search_cache_books(&normalized)?);
        };

        match self.fetch_search_candidates(original).await {
            Ok(mut candidates) => {
                candidates.retain(has_basic_fields);
                rank_by_quality(&mut candidates);

                let mut complete = self
                    .enrich_and_collect(
                        candidates,
                        self.config.search_detail_budget,
                        self.config.search_target_complete,
                    )
                    .await;

                rank_by_quality(&mut complete);
                complete.truncate(self.config.search_target_complete);

                if complete.is_empty() {
                    debug!(
                        "search '{}': no complete candidates, serving cache",
                        normalized
                    );
                    return Ok(self.store.get_search_cache_books(&normalized)?);
                }

                let now = now_millis();
                let ids: Vec<String> = complete.iter().map(|c| c.id.clone()).collect();
                for candidate in complete {
                    self.store.upsert_book(&candidate.into_book(now))?;
                }
                self.store.replace_search_cache_books(&normalized, &ids)?;
                self.store.set_search_cache_fetched_at(&normalized, now)?;

                if self.config.search_cache_cap > 0 {
                    let evicted = self.store.prune_search_cache(self.config.search_cache_cap)?;
                    if evicted > 0 {
                        debug!("search cache: evicted {} old entries", evicted);
                    }
                }

                info!("search '{}': committed {} books", normalized, ids.len());
                Ok(self.store.get_search_cache_books(&normalized)?)
            }
            Err(PipelineError::Storage(e)) => Err(PipelineError::Storage(e)),
            Err(e) => {
                // Stale cache beats no result.
                let cached = self.store.get_search_cache_books(&normalized)?;
                if !cached.is_empty() {
                    warn!("search '{}' fell back to stale cache: {}", normalized, e);
                    return Ok(cached);
                }
                match e {
                    PipelineError::EmptyUpstream => Ok(Vec::new()),
                    other => Err(other),
                }
            }
        }
    }

    /// Two-query strategy: strict title query first, loose fallback when it
    /// under-returns. The fallback result replaces the primary's.
    async fn fetch_search_candidates(
        &self,
        original: &str,
    ) -> Result<Vec<BookCandidate>, PipelineError> {
        let primary = query::build_primary_query(original);
        let mut candidates = self.provider.search(&primary, 0).await?.candidates;
        debug!(
            "search: primary query returned {} candidates",
            candidates.len()
        );

        if candidates.len() < self.config.min_primary_results {
            let fallback = query::build_fallback_query(original);
            debug!(
                "search: primary under-returned, falling back to '{}'",
                fallback
            );
            candidates = self.provider.search(&fallback, 0).await?.candidates;
            debug!(
                "search: fallback query returned {} candidates",
                candidates.len()
            );
        }

        if candidates.is_empty() {
            return Err(PipelineError::EmptyUpstream);
        }
        Ok(candidates)
    }

    /// Walk the ranked candidates, spending the detail-call budget on those
    /// missing a description, and keep the complete ones. Stops once the
    /// target count is reached. A failed detail call is swallowed; the
    /// candidate proceeds without a description and the completeness gate
    /// drops it.
    async fn enrich_and_collect(
        &self,
        ranked: Vec<BookCandidate>,
        detail_budget: u32,
        target_complete: usize,
    ) -> Vec<BookCandidate> {
        let mut detail_calls = 0u32;
        let mut complete = Vec::new();

        for mut candidate in ranked {
            if complete.len() >= target_complete {
                break;
            }

            if candidate.needs_description() && detail_calls < detail_budget {
                detail_calls += 1;
                match self.provider.volume_details(&candidate.id).await {
                    Ok(details) => {
                        if let Some(description) =
                            details.description.filter(|d| !d.trim().is_empty())
                        {
                            candidate.description = Some(description);
                        }
                    }
                    Err(e) => {
                        warn!("detail call for {} failed: {}", candidate.id, e);
                    }
                }
            }

            if is_complete(&candidate) {
                complete.push(candidate);
            }
        }

        debug!(
            "enrichment: {} detail calls made, {} complete candidates",
            detail_calls,
            complete.len()
        );
        complete
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteCatalog;
    use crate::testing::MockProvider;

    fn make_pipeline() -> (AcquisitionPipeline, Arc<MockProvider>, Arc<SqliteCatalog>) {
        let store = Arc::new(SqliteCatalog::in_memory().unwrap());
        let provider = Arc::new(MockProvider::new());
        let pipeline = AcquisitionPipeline::new(
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            Arc::clone(&provider) as Arc<dyn BookProvider>,
            PipelineConfig::default(),
        );
        (pipeline, provider, store)
    }

    #[tokio::test]
    async fn test_seed_categories_once() {
        let (pipeline, _provider, store) = make_pipeline();
        pipeline.seed_categories().unwrap();
        pipeline.seed_categories().unwrap();

        let categories = store.categories().unwrap();
        assert_eq!(categories.len(), 4);
        assert_eq!(categories[0].name, "Romance");
        assert_eq!(categories[0].query_hint, "subject:romance");
        assert!(categories.iter().all(|c| c.fetched_at == 0));
    }

    #[tokio::test]
    async fn test_empty_query_hint_is_a_noop() {
        let (pipeline, provider, _store) = make_pipeline();
        let category = Category {
            id: 1,
            name: "Blank".to_string(),
            query_hint: "   ".to_string(),
            fetched_at: 0,
        };

        let result = pipeline.refresh_category(&category).await.unwrap();
        assert!(result.is_none());
        assert_eq!(provider.search_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_search_returns_without_cache_interaction() {
        let (pipeline, provider, _store) = make_pipeline();
        let books = pipeline.search("   ").await.unwrap();
        assert!(books.is_empty());
        assert_eq!(provider.search_count().await, 0);
    }

    #[tokio::test]
    async fn test_in_flight_guard_blocks_reentry() {
        let (pipeline, _provider, _store) = make_pipeline();
        let target = RefreshTarget::Category(7);

        let guard = pipeline.inner.begin(target.clone());
        assert!(guard.is_some());
        assert!(pipeline.inner.begin(target.clone()).is_none());

        drop(guard);
        assert!(pipeline.inner.begin(target).is_some());
    }
}
