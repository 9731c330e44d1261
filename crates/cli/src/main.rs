use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookstack_core::{
    load_config, AcquisitionPipeline, Book, BookProvider, CatalogStore, Config,
    GoogleBooksProvider, SqliteCatalog,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path; missing file falls back to defaults
    let config_path = std::env::var("BOOKSTACK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No config file at {:?}, using defaults", config_path);
        Config::default()
    };

    info!("Database path: {:?}", config.database.path);

    let store: Arc<dyn CatalogStore> = Arc::new(
        SqliteCatalog::new(&config.database.path).context("Failed to open catalog store")?,
    );
    let provider: Arc<dyn BookProvider> = Arc::new(
        GoogleBooksProvider::new(config.provider.clone())
            .context("Failed to create book provider")?,
    );
    let pipeline = AcquisitionPipeline::new(
        Arc::clone(&store),
        provider,
        config.pipeline.to_pipeline_config(),
    );

    pipeline.seed_categories().context("Failed to seed categories")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((command, rest)) if command == "refresh" => {
            if !rest.is_empty() {
                bail!("refresh takes no arguments");
            }
            refresh(&pipeline, &store).await
        }
        Some((command, rest)) if command == "search" => {
            if rest.is_empty() {
                bail!("usage: bookstack search <terms>");
            }
            search(&pipeline, &rest.join(" ")).await
        }
        _ => {
            eprintln!("usage: bookstack <refresh | search <terms>>");
            std::process::exit(2);
        }
    }
}

async fn refresh(pipeline: &AcquisitionPipeline, store: &Arc<dyn CatalogStore>) -> Result<()> {
    let committed = pipeline
        .refresh_all_categories()
        .await
        .context("Category refresh failed")?;
    info!("{} categories committed fresh data", committed);

    for category in store.categories().context("Failed to read categories")? {
        let books = store
            .get_category_books(category.id)
            .context("Failed to read category books")?;
        println!("{} ({} books)", category.name, books.len());
        print_books(&books);
    }
    Ok(())
}

async fn search(pipeline: &AcquisitionPipeline, terms: &str) -> Result<()> {
    let books = pipeline
        .search(terms)
        .await
        .with_context(|| format!("Search for '{}' failed", terms))?;

    if books.is_empty() {
        println!("No results for '{}'", terms);
    } else {
        print_books(&books);
    }
    Ok(())
}

fn print_books(books: &[Book]) {
    for book in books {
        let author = book.author.as_deref().unwrap_or("-");
        let ratings = book
            .ratings_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "0".to_string());
        println!("  {} — {} ({} ratings)", book.title, author, ratings);
    }
}
