//! Catalog acquisition pipeline.
//!
//! Turns the noisy upstream search API into a small, ranked, locally cached
//! set of complete book records per category or user query, minimizing
//! detail calls and degrading to cached data on any upstream failure.

mod config;
mod runner;
mod types;

pub use config::{PipelineConfig, CACHE_TTL_MS};
pub use runner::AcquisitionPipeline;
pub use types::*;
