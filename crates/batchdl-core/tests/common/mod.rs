//! Shared helpers for orchestrator integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use batchdl_core::config::DownloadSettings;
use batchdl_core::engine::{DownloadEngine, DownloadParams, EngineError};
use batchdl_core::job::{Job, JobId, JobStatus};
use batchdl_core::progress::{ProgressEvent, ProgressSink};
use batchdl_core::store::StoreHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// What the mock does for one URL.
#[derive(Debug, Clone)]
pub enum Script {
    Succeed,
    Fail(String),
    /// Runs until `cancel()` is called, then returns `Cancelled`.
    Block,
}

/// Scripted engine. URLs without a script succeed after `delay`.
pub struct MockEngine {
    scripts: HashMap<String, Script>,
    delay: Duration,
    progress: Option<ProgressSink>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
    cancels: AtomicUsize,
    cancelled: Notify,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            delay: Duration::from_millis(10),
            progress: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            cancelled: Notify::new(),
        }
    }

    pub fn script(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Emit a 50% notification (and a playlist position for `list=` URLs) per run.
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadEngine for MockEngine {
    async fn run(
        &self,
        job_id: JobId,
        url: &str,
        _params: &DownloadParams,
    ) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(sink) = &self.progress {
            let mut event =
                ProgressEvent::downloading(job_id, 50.0, "1.0MiB/s", "00:01").with_title("Mock title");
            if url.contains("list=") {
                event = event.with_playlist(1, 3);
            }
            let _ = sink.send(event);
        }

        let result = match self.scripts.get(url).cloned().unwrap_or(Script::Succeed) {
            Script::Succeed => {
                tokio::time::sleep(self.delay).await;
                Ok(())
            }
            Script::Fail(msg) => {
                tokio::time::sleep(self.delay).await;
                Err(EngineError::Failed(msg))
            }
            Script::Block => {
                self.cancelled.notified().await;
                Err(EngineError::Cancelled)
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancelled.notify_waiters();
    }
}

pub fn settings(concurrency_limit: usize) -> DownloadSettings {
    DownloadSettings {
        concurrency_limit,
        ..DownloadSettings::default()
    }
}

pub fn settings_channel(
    concurrency_limit: usize,
) -> (watch::Sender<DownloadSettings>, watch::Receiver<DownloadSettings>) {
    watch::channel(settings(concurrency_limit))
}

pub fn urls(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("https://example.com/video/{i}")).collect()
}

pub async fn job_by_url(store: &StoreHandle, url: &str) -> Job {
    store
        .snapshot()
        .await
        .unwrap()
        .into_iter()
        .find(|j| j.url == url)
        .unwrap()
}

pub async fn count_status(store: &StoreHandle, status: JobStatus) -> usize {
    store
        .snapshot()
        .await
        .unwrap()
        .iter()
        .filter(|j| j.status == status)
        .count()
}

/// Polls `cond` every 5 ms for up to 2 s.
pub async fn wait_until<F: FnMut() -> bool>(mut cond: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Fetches a job and panics if it does not exist.
pub async fn job(store: &StoreHandle, id: JobId) -> Job {
    store.get(id).await.unwrap().expect("job exists")
}
