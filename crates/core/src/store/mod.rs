//! Book catalog store - the persistent cache behind the acquisition pipeline.
//!
//! Holds canonical book records, category definitions and the ordered
//! category/search-query associations, so reads can be served offline and
//! refreshes can be skipped while cached data is fresh.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

/// Trait for the catalog storage backend.
///
/// Association writes use replace semantics: the full ordered id list is
/// rewritten per refresh, never patched incrementally. Replaying a write
/// with identical input leaves the store unchanged.
pub trait CatalogStore: Send + Sync {
    /// Insert or fully replace a book record by id.
    ///
    /// Rejects records with an empty/whitespace title.
    fn upsert_book(&self, book: &Book) -> Result<(), StoreError>;

    /// Fetch a book by id.
    fn get_book(&self, id: &str) -> Result<Option<Book>, StoreError>;

    /// Update a book's last-opened timestamp. No-op when the id is absent.
    fn touch_last_opened(&self, id: &str, timestamp: i64) -> Result<(), StoreError>;

    /// All categories, ordered by id.
    fn categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Fetch a single category.
    fn get_category(&self, category_id: i64) -> Result<Option<Category>, StoreError>;

    /// Insert a category, returning its assigned id.
    fn insert_category(&self, name: &str, query_hint: &str) -> Result<i64, StoreError>;

    /// Books for a category, ordered by stored sort order.
    fn get_category_books(&self, category_id: i64) -> Result<Vec<Book>, StoreError>;

    /// Atomically replace the ordered book list of a category.
    ///
    /// Readers never observe a partially rewritten association; the delete
    /// and the inserts commit in one transaction.
    fn replace_category_books(
        &self,
        category_id: i64,
        ordered_book_ids: &[String],
    ) -> Result<(), StoreError>;

    fn get_category_fetched_at(&self, category_id: i64) -> Result<i64, StoreError>;

    fn set_category_fetched_at(&self, category_id: i64, timestamp: i64) -> Result<(), StoreError>;

    /// Books cached for a normalized search query, ordered by sort order.
    fn get_search_cache_books(&self, normalized_query: &str) -> Result<Vec<Book>, StoreError>;

    /// Atomically replace the ordered book list of a search cache entry,
    /// creating the entry if it does not exist yet.
    fn replace_search_cache_books(
        &self,
        normalized_query: &str,
        ordered_book_ids: &[String],
    ) -> Result<(), StoreError>;

    /// Fetch timestamp of a search cache entry, 0 when absent.
    fn get_search_cache_fetched_at(&self, normalized_query: &str) -> Result<i64, StoreError>;

    fn set_search_cache_fetched_at(
        &self,
        normalized_query: &str,
        timestamp: i64,
    ) -> Result<(), StoreError>;

    /// Evict the least recently fetched search cache entries so that at most
    /// `max_entries` remain. Returns the number of evicted entries.
    fn prune_search_cache(&self, max_entries: u32) -> Result<u32, StoreError>;
}
