//! One worker: drains the shared queue until it is empty or the batch is cancelled.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::{DownloadEngine, DownloadParams};
use crate::job::JobPatch;
use crate::store::StoreHandle;

use super::queue::SharedQueue;

/// What one worker did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct WorkerTally {
    pub completed: usize,
    pub failed: usize,
    pub interrupted: usize,
}

pub(crate) async fn run_worker(
    worker: usize,
    store: StoreHandle,
    engine: Arc<dyn DownloadEngine>,
    queue: SharedQueue,
    params: Arc<DownloadParams>,
    cancel: CancellationToken,
) -> WorkerTally {
    let mut tally = WorkerTally::default();
    loop {
        if cancel.is_cancelled() {
            tracing::debug!(worker, "cancel requested; worker exiting");
            break;
        }
        let Some(job) = queue.pop() else {
            break;
        };
        // The store flips Pending -> Downloading only while this batch is live,
        // so a job is never run by two batches at once.
        match store.claim(job.id, &cancel).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(worker, job_id = %job.id, "job not claimable; skipped");
                continue;
            }
            Err(_) => {
                tracing::warn!(worker, "job store closed; worker exiting");
                break;
            }
        }
        if cancel.is_cancelled() {
            // Stopped between the claim and the engine call; nothing ran.
            let _ = store.patch(job.id, JobPatch::requeued());
            tracing::debug!(worker, job_id = %job.id, "claimed job handed back after cancel");
            break;
        }
        tracing::debug!(worker, job_id = %job.id, url = %job.url, "download started");

        let result = engine.run(job.id, &job.url, &params).await;
        let write = match result {
            Ok(()) => {
                tally.completed += 1;
                tracing::info!(worker, job_id = %job.id, "download completed");
                store.patch(job.id, JobPatch::completed())
            }
            Err(e) if cancel.is_cancelled() => {
                // Interrupted by stop: the job keeps whatever status it last had.
                tally.interrupted += 1;
                tracing::debug!(worker, job_id = %job.id, "download interrupted: {}", e);
                Ok(())
            }
            Err(e) => {
                tally.failed += 1;
                tracing::warn!(worker, job_id = %job.id, "download failed: {}", e);
                store.patch(job.id, JobPatch::failed(e.to_string()))
            }
        };
        if write.is_err() {
            tracing::warn!(worker, "job store closed; worker exiting");
            break;
        }
    }
    tally
}
