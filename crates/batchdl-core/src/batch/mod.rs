//! Batch controller: the public start/stop entry point.
//!
//! Composes the job store, the worker pool and the engine. Owns the
//! `is_downloading` flag, the per-batch cancel token and the batch generation
//! used to keep a stopped batch's cleanup from touching its successor.

mod guard;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::DownloadSettings;
use crate::engine::DownloadEngine;
use crate::job::PlaylistSummary;
use crate::scheduler;
use crate::store::{StoreError, StoreHandle};

use guard::BatchGuard;

/// Result of [`BatchController::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// A batch was already running; nothing changed.
    AlreadyRunning,
    /// No job was `Pending` or `Error`.
    NothingToDo,
    /// Every worker exited. Says nothing about individual job success.
    Finished(BatchReport),
}

/// Counts for one finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub eligible: usize,
    pub workers: usize,
    pub completed: usize,
    pub failed: usize,
    /// Engine calls cut short by [`BatchController::stop`].
    pub interrupted: usize,
    pub cancelled: bool,
}

/// Lifecycle shared by controller clones. `active` decides `AlreadyRunning`;
/// `downloading` is what callers see and is only raised once the batch has
/// work to do.
#[derive(Debug, Default)]
struct BatchState {
    downloading: AtomicBool,
    inner: Mutex<BatchInner>,
}

#[derive(Debug)]
struct BatchInner {
    generation: u64,
    active: bool,
    cancel: CancellationToken,
}

impl Default for BatchInner {
    fn default() -> Self {
        Self {
            generation: 0,
            active: false,
            cancel: CancellationToken::new(),
        }
    }
}

impl BatchState {
    fn lock(&self) -> MutexGuard<'_, BatchInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserves the controller for a new batch: bumps the generation and
    /// installs a fresh cancel token. `None` if a batch is already running.
    fn begin(&self) -> Option<(u64, CancellationToken)> {
        let mut inner = self.lock();
        if inner.active {
            return None;
        }
        inner.active = true;
        inner.generation += 1;
        inner.cancel = CancellationToken::new();
        Some((inner.generation, inner.cancel.clone()))
    }

    /// Raises `is_downloading` for batch `generation` unless it was stopped or
    /// superseded in the meantime.
    fn publish(&self, generation: u64) -> bool {
        let inner = self.lock();
        if inner.generation != generation || !inner.active {
            return false;
        }
        self.downloading.store(true, Ordering::SeqCst);
        true
    }

    /// Ends batch `generation` if it is still the current one.
    fn finish(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.active = false;
        self.downloading.store(false, Ordering::SeqCst);
        true
    }

    fn cancel(&self) {
        let mut inner = self.lock();
        inner.cancel.cancel();
        inner.active = false;
        self.downloading.store(false, Ordering::SeqCst);
    }
}

/// Start/stop lifecycle over one job store and one engine.
///
/// Cheap to clone; clones share the same state, so one clone can `stop()`
/// while another is awaiting `start()`.
#[derive(Clone)]
pub struct BatchController {
    store: StoreHandle,
    engine: Arc<dyn DownloadEngine>,
    settings: watch::Receiver<DownloadSettings>,
    state: Arc<BatchState>,
}

impl BatchController {
    /// `settings` is read once per `start()`; later changes do not affect a
    /// running batch.
    pub fn new(
        store: StoreHandle,
        engine: Arc<dyn DownloadEngine>,
        settings: watch::Receiver<DownloadSettings>,
    ) -> Self {
        Self {
            store,
            engine,
            settings,
            state: Arc::default(),
        }
    }

    /// Runs one batch over every `Pending` or `Error` job and returns once all
    /// workers have exited. Failed jobs do not make this an error; only a
    /// closed store does.
    pub async fn start(&self) -> Result<BatchOutcome, StoreError> {
        let Some((generation, cancel)) = self.state.begin() else {
            tracing::debug!("start ignored: batch already running");
            return Ok(BatchOutcome::AlreadyRunning);
        };
        let _guard = BatchGuard {
            state: Arc::clone(&self.state),
            store: self.store.clone(),
            generation,
        };

        let settings = self.settings.borrow().clone();
        let jobs = self.store.begin_batch().await?;
        if jobs.is_empty() {
            tracing::debug!("start ignored: no eligible jobs");
            return Ok(BatchOutcome::NothingToDo);
        }
        self.state.publish(generation);

        let eligible = jobs.len();
        let limit = settings.concurrency_limit();
        tracing::info!(
            batch = generation,
            eligible,
            concurrency_limit = limit,
            "batch started"
        );

        let summary = scheduler::run_worker_pool(
            self.store.clone(),
            Arc::clone(&self.engine),
            jobs,
            settings.params(),
            limit,
            cancel.clone(),
        )
        .await;

        let report = BatchReport {
            eligible,
            workers: summary.workers,
            completed: summary.completed,
            failed: summary.failed,
            interrupted: summary.interrupted,
            cancelled: cancel.is_cancelled(),
        };
        tracing::info!(
            batch = generation,
            completed = report.completed,
            failed = report.failed,
            interrupted = report.interrupted,
            cancelled = report.cancelled,
            "batch finished"
        );
        Ok(BatchOutcome::Finished(report))
    }

    /// Requests cancellation and returns at once. Workers stop pulling new jobs;
    /// in-flight engine calls are aborted through the engine's own cancel.
    pub fn stop(&self) {
        self.state.cancel();
        self.engine.cancel();
        let _ = self.store.clear_playlist_summary();
        tracing::info!("batch stop requested");
    }

    pub fn is_downloading(&self) -> bool {
        self.state.downloading.load(Ordering::SeqCst)
    }

    pub async fn playlist_summary(&self) -> Result<Option<PlaylistSummary>, StoreError> {
        self.store.playlist_summary().await
    }
}

impl std::fmt::Debug for BatchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchController")
            .field("downloading", &self.is_downloading())
            .finish_non_exhaustive()
    }
}
