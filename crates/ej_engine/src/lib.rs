//! External-jobs crawl engine: fetch, classify and persist job postings with
//! a bounded pool of worker threads.
mod classify;
mod engine;
mod fetch;
mod pool;
mod progress;
mod queue;
mod state;
mod store;
mod types;

pub use classify::{Classifier, JobPageClassifier, PageSelectors, ParseError};
pub use engine::{CrawlEngine, EngineConfig, EngineError, EngineState};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_BASE_URL};
pub use pool::{WorkerContext, WorkerPool, DEFAULT_WORKER_COUNT};
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use queue::{DoneGuard, WorkQueue};
pub use state::CrawlState;
pub use store::{SqliteStore, Store, StoreError, EXTERNAL_JOBS_TABLE};
pub use types::{
    ClassificationResult, CrawlStats, CrawlTask, EngineEvent, ExternalJobRecord, FailureKind,
    FetchError, JobId, RawPage, TableHandle, TaskOutcome,
};
