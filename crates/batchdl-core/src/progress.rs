//! Progress notifications and their aggregation onto the job store.
//!
//! Engines push [`ProgressEvent`]s, addressed only by job id, into a
//! [`ProgressSink`]. The aggregator task forwards each event to the store actor,
//! which merges it into the matching job (or drops it if the job is gone). This
//! path runs concurrently with the worker pool and can deliver an event after
//! the worker's terminal write for the same run. A `downloading` event
//! therefore only lands on a job that is in flight; `finished` and `error`
//! events race with the worker's write and the last one wins.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::job::{Job, JobId, JobPatch, JobStatus};
use crate::store::StoreHandle;

/// Sending half of the progress channel, given to the engine.
pub type ProgressSink = mpsc::UnboundedSender<ProgressEvent>;

/// Receiving half of the progress channel, drained by the aggregator.
pub type ProgressStream = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn progress_channel() -> (ProgressSink, ProgressStream) {
    mpsc::unbounded_channel()
}

/// Status label carried by a notification. Unknown labels read as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Error,
    #[serde(other)]
    Other,
}

/// Asynchronous progress notification for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub id: JobId,
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub eta: String,
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_index: Option<u32>,
    #[serde(default, alias = "playlist_count", skip_serializing_if = "Option::is_none")]
    pub playlist_total: Option<u32>,
    /// Failure message; only meaningful with `status = error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn downloading(id: JobId, percent: f64, speed: impl Into<String>, eta: impl Into<String>) -> Self {
        Self {
            id,
            percent,
            speed: speed.into(),
            eta: eta.into(),
            status: ProgressStatus::Downloading,
            title: None,
            playlist_index: None,
            playlist_total: None,
            error: None,
        }
    }

    pub fn finished(id: JobId) -> Self {
        Self {
            status: ProgressStatus::Finished,
            ..Self::downloading(id, 100.0, "", "")
        }
    }

    /// Terminal failure notification carrying the same message the engine returns.
    pub fn failed(id: JobId, message: impl Into<String>) -> Self {
        Self {
            status: ProgressStatus::Error,
            error: Some(message.into()),
            ..Self::downloading(id, 0.0, "", "")
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_playlist(mut self, index: u32, total: u32) -> Self {
        self.playlist_index = Some(index);
        self.playlist_total = Some(total);
        self
    }

    /// Parses one JSON notification, e.g. a line from an engine speaking JSON.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// `finished` -> Completed, `error` -> Error, anything else -> Downloading.
    pub fn job_status(&self) -> JobStatus {
        match self.status {
            ProgressStatus::Finished => JobStatus::Completed,
            ProgressStatus::Error => JobStatus::Error,
            ProgressStatus::Downloading | ProgressStatus::Other => JobStatus::Downloading,
        }
    }

    /// Whether this event may be merged into a job currently in `current`.
    ///
    /// Progress only ever lands on a job that is in flight, so a late
    /// `downloading` event cannot reopen a job the worker already finished or
    /// failed, nor mark a queued job as started. Terminal events may also
    /// replace a terminal status.
    pub fn applies_to(&self, current: JobStatus) -> bool {
        match self.job_status() {
            JobStatus::Completed | JobStatus::Error => current.is_active() || current.is_terminal(),
            _ => current.is_active(),
        }
    }

    /// Playlist position, only when both index and total are present.
    pub fn playlist_position(&self) -> Option<(u32, u32)> {
        self.playlist_index.zip(self.playlist_total)
    }

    /// Patch merged into the addressed job.
    pub fn to_patch(&self) -> JobPatch {
        let (playlist_index, playlist_total) = match self.playlist_position() {
            Some((index, total)) => (Some(index), Some(total)),
            None => (None, None),
        };
        JobPatch {
            status: Some(self.job_status()),
            progress: Some(self.percent),
            speed: Some(self.speed.clone()),
            eta: Some(self.eta.clone()),
            title: self.title.clone().filter(|t| !t.is_empty()),
            error: match self.status {
                ProgressStatus::Error => self.error.clone(),
                _ => None,
            },
            playlist_index,
            playlist_total,
            ..JobPatch::default()
        }
    }
}

/// Spawns the aggregator: drains `stream` into the store until either side closes.
pub fn spawn_aggregator(mut stream: ProgressStream, store: StoreHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = stream.recv().await {
            if store.apply_progress(event).is_err() {
                tracing::debug!("job store closed; progress aggregator stopping");
                return;
            }
        }
        tracing::debug!("progress channel closed; progress aggregator stopping");
    })
}

/// Counts and totals over a job list, for status lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueOverview {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    /// Sum of progress percentages over all jobs.
    pub progress_sum: f64,
    /// Sum of known file sizes.
    pub known_bytes: u64,
}

impl QueueOverview {
    pub fn from_jobs(jobs: &[Job]) -> Self {
        let mut overview = Self {
            total: jobs.len(),
            ..Self::default()
        };
        for job in jobs {
            match job.status {
                JobStatus::Pending => overview.pending += 1,
                JobStatus::Fetching | JobStatus::Downloading => overview.active += 1,
                JobStatus::Completed => overview.completed += 1,
                JobStatus::Error => overview.failed += 1,
            }
            overview.progress_sum += job.progress.clamp(0.0, 100.0);
            overview.known_bytes += job.file_size_bytes.unwrap_or(0);
        }
        overview
    }

    /// Overall fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.progress_sum / (self.total as f64 * 100.0)).min(1.0)
    }

    /// Jobs that reached `Completed` or `Error`.
    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }
}
