use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::{CrawlStats, JobId};

#[derive(Debug, Default)]
struct Sets {
    crawled: HashSet<JobId>,
    external: HashSet<JobId>,
    failed: HashSet<JobId>,
    processed: usize,
}

/// Process-scoped crawl bookkeeping shared by all workers. Membership only
/// grows for the lifetime of a run.
#[derive(Debug, Default)]
pub struct CrawlState {
    sets: Mutex<Sets>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_external(&self, job_id: &str) {
        self.lock().external.insert(job_id.to_string());
    }

    pub fn mark_failed(&self, job_id: &str) {
        self.lock().failed.insert(job_id.to_string());
    }

    /// Records that processing of `job_id` finished and returns the counters
    /// as they stand right after the update.
    pub fn finish(&self, job_id: &str) -> CrawlStats {
        let mut sets = self.lock();
        sets.crawled.insert(job_id.to_string());
        sets.processed += 1;
        stats_of(&sets)
    }

    pub fn stats(&self) -> CrawlStats {
        stats_of(&self.lock())
    }

    pub fn is_crawled(&self, job_id: &str) -> bool {
        self.lock().crawled.contains(job_id)
    }

    pub fn is_external(&self, job_id: &str) -> bool {
        self.lock().external.contains(job_id)
    }

    pub fn is_failed(&self, job_id: &str) -> bool {
        self.lock().failed.contains(job_id)
    }

    pub fn crawled_ids(&self) -> HashSet<JobId> {
        self.lock().crawled.clone()
    }

    pub fn external_ids(&self) -> HashSet<JobId> {
        self.lock().external.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Sets> {
        self.sets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn stats_of(sets: &Sets) -> CrawlStats {
    CrawlStats {
        crawled: sets.crawled.len(),
        external: sets.external.len(),
        failed: sets.failed.len(),
        processed: sets.processed,
    }
}
