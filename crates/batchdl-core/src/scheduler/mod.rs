//! Worker-pool scheduler.
//!
//! Runs a batch's queued jobs with at most `concurrency_limit` engine calls in
//! flight. Workers pull from one shared FIFO, claim each job in the store
//! (`Pending -> Downloading`), await the engine and write the terminal status
//! back. The batch cancel token is checked before each new job; a job whose
//! engine call was cut short by a stop is left as it was.

mod queue;
mod worker;

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::engine::{DownloadEngine, DownloadParams};
use crate::job::QueuedJob;
use crate::store::StoreHandle;

use queue::SharedQueue;
use worker::{run_worker, WorkerTally};

/// Number of workers for a batch: the limit (at least 1), capped by the work available.
pub fn worker_count(concurrency_limit: usize, eligible: usize) -> usize {
    concurrency_limit.max(1).min(eligible)
}

/// Outcome of one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub workers: usize,
    pub completed: usize,
    pub failed: usize,
    /// Engine calls that ended after the batch was cancelled; no status was written.
    pub interrupted: usize,
}

impl PoolSummary {
    fn absorb(&mut self, tally: WorkerTally) {
        self.completed += tally.completed;
        self.failed += tally.failed;
        self.interrupted += tally.interrupted;
    }
}

/// Runs `jobs` to exhaustion (or until `cancel` is raised) and returns once
/// every worker has exited.
pub async fn run_worker_pool(
    store: StoreHandle,
    engine: Arc<dyn DownloadEngine>,
    jobs: Vec<QueuedJob>,
    params: DownloadParams,
    concurrency_limit: usize,
    cancel: CancellationToken,
) -> PoolSummary {
    let workers = worker_count(concurrency_limit, jobs.len());
    let mut summary = PoolSummary {
        workers,
        ..PoolSummary::default()
    };
    if workers == 0 {
        return summary;
    }

    let queue = SharedQueue::new(jobs);
    let params = Arc::new(params);
    let mut join_set = JoinSet::new();
    for worker in 0..workers {
        join_set.spawn(run_worker(
            worker,
            store.clone(),
            Arc::clone(&engine),
            queue.clone(),
            Arc::clone(&params),
            cancel.clone(),
        ));
    }

    while let Some(res) = join_set.join_next().await {
        match res {
            Ok(tally) => summary.absorb(tally),
            Err(e) => tracing::warn!("worker task join: {}", e),
        }
    }
    if queue.len() > 0 {
        tracing::debug!(left = queue.len(), "pool stopped with jobs still queued");
    }
    summary
}
