use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::classify::Classifier;
use crate::engine::EngineError;
use crate::fetch::Fetcher;
use crate::progress::ProgressSink;
use crate::queue::{DoneGuard, WorkQueue};
use crate::state::CrawlState;
use crate::store::Store;
use crate::{
    ClassificationResult, CrawlTask, EngineEvent, ExternalJobRecord, FailureKind, FetchError,
    RawPage, TaskOutcome,
};

pub const DEFAULT_WORKER_COUNT: usize = 10;

const IO_THREADS: usize = 2;

/// Collaborators shared by every worker of a pool.
#[derive(Clone)]
pub struct WorkerContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub classifier: Arc<dyn Classifier>,
    pub store: Arc<dyn Store>,
    pub state: Arc<CrawlState>,
    pub sink: Arc<dyn ProgressSink>,
}

/// Fixed set of long-lived worker threads draining a shared `WorkQueue`.
///
/// Workers run until the queue is closed. Dropping the pool closes the queue
/// without waiting for the threads; `shutdown` waits.
pub struct WorkerPool {
    queue: Arc<WorkQueue<CrawlTask>>,
    state: Arc<CrawlState>,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn start(size: usize, ctx: WorkerContext) -> Result<Self, EngineError> {
        if size == 0 {
            return Err(EngineError::NoWorkers);
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(IO_THREADS)
            .thread_name("crawl-io")
            .enable_all()
            .build()
            .map(Arc::new)
            .map_err(EngineError::Runtime)?;

        let mut pool = Self {
            queue: Arc::new(WorkQueue::new()),
            state: ctx.state.clone(),
            cancel: CancellationToken::new(),
            workers: Vec::with_capacity(size),
        };

        for index in 0..size {
            let worker = Worker {
                queue: pool.queue.clone(),
                ctx: ctx.clone(),
                runtime: runtime.clone(),
                cancel: pool.cancel.clone(),
            };
            let handle = thread::Builder::new()
                .name(format!("crawl-worker-{index}"))
                .spawn(move || worker.run())
                .map_err(EngineError::WorkerSpawn)?;
            pool.workers.push(handle);
        }

        engine_debug!("Started {} crawl workers", size);
        Ok(pool)
    }

    pub fn submit(&self, task: CrawlTask) {
        self.queue.enqueue(task);
    }

    /// Blocks until every submitted task has been acknowledged.
    pub fn await_drained(&self) {
        self.queue.await_drained();
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn in_flight(&self) -> usize {
        self.queue.in_flight()
    }

    pub fn state(&self) -> &Arc<CrawlState> {
        &self.state
    }

    /// Lets workers finish the backlog, then joins them.
    pub fn shutdown(mut self) {
        self.close_and_join();
    }

    /// Cancels in-flight fetches, then joins. Tasks still queued are
    /// processed with their fetch resolving to `FailureKind::Cancelled`.
    pub fn shutdown_now(mut self) {
        self.cancel.cancel();
        self.close_and_join();
    }

    fn close_and_join(&mut self) {
        self.queue.close();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                engine_error!("A crawl worker exited by panic");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.queue.close();
    }
}

struct Worker {
    queue: Arc<WorkQueue<CrawlTask>>,
    ctx: WorkerContext,
    runtime: Arc<Runtime>,
    cancel: CancellationToken,
}

impl Worker {
    fn run(self) {
        while let Some(task) = self.queue.dequeue() {
            let _done = DoneGuard::new(&self.queue);

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process(&task)))
                .unwrap_or_else(|_| {
                    engine_error!("Processing job {} panicked", task.job_id);
                    TaskOutcome::Panicked
                });

            if outcome.is_failure() {
                self.ctx.state.mark_failed(&task.job_id);
            }
            let stats = self.ctx.state.finish(&task.job_id);
            engine_info!(
                "Crawled: {} || Total External Jobs: {}",
                stats.crawled,
                stats.external
            );
            let event = EngineEvent::TaskCompleted {
                job_id: task.job_id.clone(),
                outcome,
                stats,
            };
            // The worker must outlive a misbehaving observer.
            if panic::catch_unwind(AssertUnwindSafe(|| self.ctx.sink.emit(event))).is_err() {
                engine_error!("Progress sink panicked on job {}", task.job_id);
            }
        }
        engine_debug!("Work queue closed; worker exiting");
    }

    fn process(&self, task: &CrawlTask) -> TaskOutcome {
        engine_info!("Checking if job {} is external", task.job_id);

        let page = match self.fetch(&task.job_id) {
            Ok(page) => page,
            Err(err) => {
                engine_warn!("Fetching job {} failed: {}", task.job_id, err);
                return TaskOutcome::FetchFailed(err.kind);
            }
        };

        let classification = match self.ctx.classifier.classify(&page) {
            Ok(result) => result,
            Err(err) => {
                engine_warn!("Job {} page could not be parsed: {}", task.job_id, err);
                return TaskOutcome::ParseFailed;
            }
        };

        match classification {
            ClassificationResult::Internal => {
                engine_debug!("Job {} applies on-platform", task.job_id);
                TaskOutcome::Internal
            }
            ClassificationResult::External { title, company } => {
                engine_info!("External job found! >> Job_Id: {}", task.job_id);
                self.ctx.state.mark_external(&task.job_id);
                let record = ExternalJobRecord {
                    id: task.job_id.clone(),
                    title,
                    company,
                };
                match self.ctx.store.insert(&task.table, &record) {
                    Ok(()) => TaskOutcome::External,
                    Err(err) => {
                        engine_error!("Storing job {} failed: {}", task.job_id, err);
                        TaskOutcome::StoreFailed
                    }
                }
            }
        }
    }

    fn fetch(&self, job_id: &str) -> Result<RawPage, FetchError> {
        if self.cancel.is_cancelled() {
            return Err(cancelled());
        }
        self.runtime.block_on(async {
            tokio::select! {
                _ = self.cancel.cancelled() => Err(cancelled()),
                page = self.ctx.fetcher.fetch(job_id) => page,
            }
        })
    }
}

fn cancelled() -> FetchError {
    FetchError::new(FailureKind::Cancelled, "crawl cancelled")
}
