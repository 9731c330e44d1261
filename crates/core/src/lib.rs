pub mod config;
pub mod pipeline;
pub mod provider;
pub mod quality;
pub mod query;
pub mod store;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use pipeline::{
    AcquisitionPipeline, CategoriesSnapshot, CategoryRead, CategoryUpdate, CategoryWithBooks,
    PipelineConfig, PipelineError,
};
pub use provider::{
    BookCandidate, BookProvider, GoogleBooksConfig, GoogleBooksProvider, ProviderError, SearchPage,
};
pub use store::{Book, CatalogStore, Category, SqliteCatalog, StoreError};
