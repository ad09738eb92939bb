use std::fmt;

/// Externally supplied job posting identifier; the key for every record.
pub type JobId = String;

/// A unit of work: one job id bound to the table it should be persisted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub job_id: JobId,
    pub table: TableHandle,
}

impl CrawlTask {
    pub fn new(job_id: impl Into<JobId>, table: TableHandle) -> Self {
        Self {
            job_id: job_id.into(),
            table,
        }
    }
}

/// Handle to an existing table returned by `Store::ensure_schema`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    name: String,
}

impl TableHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Decoded job page as delivered by a `Fetcher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub job_id: JobId,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationResult {
    Internal,
    External { title: String, company: String },
}

impl ClassificationResult {
    pub fn is_external(&self) -> bool {
        matches!(self, ClassificationResult::External { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalJobRecord {
    pub id: JobId,
    pub title: String,
    pub company: String,
}

/// How a single task ended. Every variant is acknowledged on the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Internal,
    External,
    FetchFailed(FailureKind),
    ParseFailed,
    StoreFailed,
    Panicked,
}

impl TaskOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, TaskOutcome::Internal | TaskOutcome::External)
    }
}

/// Aggregate counters for a crawl, taken as one consistent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlStats {
    /// Distinct ids whose processing finished, successfully or not.
    pub crawled: usize,
    /// Distinct ids classified as external.
    pub external: usize,
    /// Distinct ids that hit a fetch, parse or store failure.
    pub failed: usize,
    /// Acknowledged tasks, duplicates included.
    pub processed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TaskCompleted {
        job_id: JobId,
        outcome: TaskOutcome,
        stats: CrawlStats,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch failed ({kind}): {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "undecodable body"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
