mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use ej_engine::{CrawlEngine, SqliteStore, Store};
use engine_logging::{engine_info, engine_warn};

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let config = config::load(&config_path)?;

    logging::initialize(config.log_destination, &config.log_dir);
    engine_info!("========= External Jobs Scraper Started =========");
    engine_info!(
        "Crawling {} jobs with {} workers (config {:?})",
        config.job_ids.len(),
        config.workers,
        config_path
    );

    let store = Arc::new(SqliteStore::new(&config.database_path));
    let mut engine = CrawlEngine::from_config(&config.engine_config(), store.clone())
        .context("failed to build crawl engine")?;
    let stats = engine
        .run(config.job_ids.iter().cloned())
        .context("crawl failed")?;

    engine_info!(
        "Crawled: {} || Total External Jobs: {} || Failed: {}",
        stats.crawled,
        stats.external,
        stats.failed
    );

    let table = store
        .ensure_schema()
        .context("failed to reopen external jobs table")?;
    match store.count(&table) {
        Ok(rows) => engine_info!(
            "{} external jobs stored in {:?}",
            rows,
            store.path()
        ),
        Err(err) => engine_warn!("Could not count stored jobs: {}", err),
    }
    Ok(())
}
