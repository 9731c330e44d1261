//! Acquisition pipeline tuning knobs.

/// Uniform staleness TTL for categories and search entries: 7 days.
pub const CACHE_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Tuning for the acquisition pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Staleness TTL in milliseconds.
    pub cache_ttl_ms: i64,
    /// Detail calls allowed within one category refresh.
    pub category_detail_budget: u32,
    /// Complete books targeted (and kept) per category.
    pub category_target_complete: usize,
    /// Detail calls allowed within one search refresh. Higher than the
    /// category budget since the user is actively waiting.
    pub search_detail_budget: u32,
    /// Complete books targeted (and kept) per search.
    pub search_target_complete: usize,
    /// Primary-query hit count below which the fallback query runs.
    pub min_primary_results: usize,
    /// Max retained search cache entries, LRU-evicted by fetch time.
    /// 0 disables eviction.
    pub search_cache_cap: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: CACHE_TTL_MS,
            category_detail_budget: 20,
            category_target_complete: 12,
            search_detail_budget: 30,
            search_target_complete: 20,
            min_primary_results: 10,
            search_cache_cap: 256,
        }
    }
}
