use std::io;
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use thiserror::Error;

use crate::classify::{Classifier, JobPageClassifier, PageSelectors, ParseError};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::pool::{WorkerContext, WorkerPool, DEFAULT_WORKER_COUNT};
use crate::progress::{NullProgressSink, ProgressSink};
use crate::state::CrawlState;
use crate::store::{Store, StoreError};
use crate::{CrawlStats, CrawlTask, FetchError, JobId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("crawl engine was already started")]
    AlreadyStarted,
    #[error("worker pool needs at least one worker")]
    NoWorkers,
    #[error("failed to prepare storage: {0}")]
    Schema(#[source] StoreError),
    #[error("failed to build async runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to spawn crawl worker: {0}")]
    WorkerSpawn(#[source] io::Error),
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] FetchError),
    #[error("invalid page selectors: {0}")]
    Selectors(#[from] ParseError),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub worker_count: usize,
    pub fetch: FetchSettings,
    pub selectors: PageSelectors,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            fetch: FetchSettings::default(),
            selectors: PageSelectors::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Running,
    Drained,
}

/// Runs one batch of job ids through a worker pool and reports the totals.
///
/// An engine is single-use: `run` moves it from `NotStarted` through
/// `Running` to `Drained`, and a second call fails with
/// `EngineError::AlreadyStarted`.
pub struct CrawlEngine {
    worker_count: usize,
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn Store>,
    sink: Arc<dyn ProgressSink>,
    crawl_state: Arc<CrawlState>,
    state: EngineState,
}

impl CrawlEngine {
    pub fn new(
        worker_count: usize,
        fetcher: Arc<dyn Fetcher>,
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            worker_count,
            fetcher,
            classifier,
            store,
            sink: Arc::new(NullProgressSink),
            crawl_state: Arc::new(CrawlState::new()),
            state: EngineState::NotStarted,
        }
    }

    /// Builds an engine fetching over HTTP and classifying with the
    /// configured selectors.
    pub fn from_config(config: &EngineConfig, store: Arc<dyn Store>) -> Result<Self, EngineError> {
        let classifier = JobPageClassifier::new(&config.selectors)?;
        let fetcher =
            ReqwestFetcher::new(config.fetch.clone()).map_err(EngineError::HttpClient)?;
        Ok(Self::new(
            config.worker_count,
            Arc::new(fetcher),
            Arc::new(classifier),
            store,
        ))
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn crawl_state(&self) -> &Arc<CrawlState> {
        &self.crawl_state
    }

    /// Prepares the schema, starts the workers, enqueues every id in order
    /// and blocks until all of them have been processed.
    pub fn run<I>(&mut self, job_ids: I) -> Result<CrawlStats, EngineError>
    where
        I: IntoIterator,
        I::Item: Into<JobId>,
    {
        if self.state != EngineState::NotStarted {
            return Err(EngineError::AlreadyStarted);
        }

        let table = self.store.ensure_schema().map_err(EngineError::Schema)?;

        let pool = WorkerPool::start(
            self.worker_count,
            WorkerContext {
                fetcher: self.fetcher.clone(),
                classifier: self.classifier.clone(),
                store: self.store.clone(),
                state: self.crawl_state.clone(),
                sink: self.sink.clone(),
            },
        )?;
        self.state = EngineState::Running;

        let mut enqueued = 0usize;
        for job_id in job_ids {
            pool.submit(CrawlTask::new(job_id, table.clone()));
            enqueued += 1;
        }
        engine_info!("Enqueued {} jobs for {} workers", enqueued, pool.size());

        pool.await_drained();
        self.state = EngineState::Drained;
        pool.shutdown();

        let stats = self.crawl_state.stats();
        engine_info!(
            "Crawl finished: {} crawled, {} external, {} failed",
            stats.crawled,
            stats.external,
            stats.failed
        );
        if stats.failed > 0 {
            engine_warn!("{} jobs could not be fully processed", stats.failed);
        }
        Ok(stats)
    }
}
