//! Scraper configuration, read from a RON file.
//!
//! Every field is optional; a missing file yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use ej_engine::{
    EngineConfig, FetchSettings, PageSelectors, DEFAULT_BASE_URL, DEFAULT_WORKER_COUNT,
};
use serde::Deserialize;

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_PATH: &str = "ej_scraper.ron";

/// The fixed batch crawled when no list is configured.
pub const DEFAULT_JOB_IDS: [&str; 10] = [
    "59702994", "59700291", "59685698", "59718549", "59710383", "59709363", "59704904",
    "59712101", "59701412", "59704904",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScraperConfig {
    pub job_ids: Vec<String>,
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_destination: LogDestination,
    pub workers: usize,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            job_ids: DEFAULT_JOB_IDS.iter().map(|id| id.to_string()).collect(),
            database_path: PathBuf::from("./data/jobs.db"),
            log_dir: PathBuf::from("./logs"),
            log_destination: LogDestination::Both,
            workers: DEFAULT_WORKER_COUNT,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ScraperConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            worker_count: self.workers,
            fetch: FetchSettings {
                base_url: self.base_url.clone(),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                ..FetchSettings::default()
            },
            selectors: PageSelectors::default(),
        }
    }
}

/// Loads the config at `path`, falling back to defaults when it does not exist.
pub fn load(path: &Path) -> Result<ScraperConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ScraperConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    ron::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
