//! Types for queued downloads: identifiers, status, the job record and patches.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::url_model;

/// Job identifier. Assigned by the store from a per-store counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Fetching,
    Downloading,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Fetching => "fetching",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Picked up by the next batch start (retry of failed work included).
    pub fn is_eligible(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Error)
    }

    /// An engine invocation is (or appears to be) in flight.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Fetching | JobStatus::Downloading)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub url: String,
    /// Display label; starts as the URL until the engine reports a real title.
    pub title: String,
    pub status: JobStatus,
    /// Percent complete in `[0, 100]`.
    pub progress: f64,
    pub speed: String,
    pub eta: String,
    pub error: Option<String>,
    pub is_playlist: bool,
    pub playlist_index: Option<u32>,
    pub playlist_total: Option<u32>,
    pub file_size_bytes: Option<u64>,
}

impl Job {
    pub(crate) fn new(id: JobId, url: String) -> Self {
        let is_playlist = url_model::is_playlist_url(&url);
        Self {
            id,
            title: url.clone(),
            url,
            status: JobStatus::Pending,
            progress: 0.0,
            speed: String::new(),
            eta: String::new(),
            error: None,
            is_playlist,
            playlist_index: None,
            playlist_total: None,
            file_size_bytes: None,
        }
    }

    /// Back to `Pending` with per-attempt fields cleared. Title and size survive.
    pub(crate) fn reset_for_retry(&mut self) {
        self.status = JobStatus::Pending;
        self.progress = 0.0;
        self.speed.clear();
        self.eta.clear();
        self.error = None;
        self.playlist_index = None;
        self.playlist_total = None;
    }

    /// Merges `patch` into the record. Returns false when the patch was refused:
    /// a completed job never moves to another status.
    pub(crate) fn apply(&mut self, patch: &JobPatch) -> bool {
        if self.status == JobStatus::Completed
            && patch.status.is_some_and(|s| s != JobStatus::Completed)
        {
            return false;
        }

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(ref speed) = patch.speed {
            self.speed.clone_from(speed);
        }
        if let Some(ref eta) = patch.eta {
            self.eta.clone_from(eta);
        }
        if let Some(ref title) = patch.title {
            if !title.is_empty() {
                self.title.clone_from(title);
            }
        }
        if let Some(ref error) = patch.error {
            self.error = Some(error.clone());
        }
        if patch.playlist_index.is_some() {
            self.playlist_index = patch.playlist_index;
        }
        if patch.playlist_total.is_some() {
            self.playlist_total = patch.playlist_total;
        }
        if patch.file_size_bytes.is_some() {
            self.file_size_bytes = patch.file_size_bytes;
        }

        if self.status != JobStatus::Error {
            self.error = None;
        }
        true
    }
}

/// Partial update for a job; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub progress: Option<f64>,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub title: Option<String>,
    pub error: Option<String>,
    pub playlist_index: Option<u32>,
    pub playlist_total: Option<u32>,
    pub file_size_bytes: Option<u64>,
}

impl JobPatch {
    /// Worker picked the job up and is about to call the engine.
    pub fn started() -> Self {
        Self {
            status: Some(JobStatus::Downloading),
            ..Self::default()
        }
    }

    /// Claimed but never handed to the engine; back in the queue.
    pub fn requeued() -> Self {
        Self {
            status: Some(JobStatus::Pending),
            ..Self::default()
        }
    }

    /// Engine returned success.
    pub fn completed() -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100.0),
            speed: Some(String::new()),
            eta: Some(String::new()),
            ..Self::default()
        }
    }

    /// Engine returned a failure with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error: Some(message.into()),
            speed: Some(String::new()),
            eta: Some(String::new()),
            ..Self::default()
        }
    }

    /// Size reported by a separate info fetch, used for display totals only.
    pub fn file_size(bytes: u64) -> Self {
        Self {
            file_size_bytes: Some(bytes),
            ..Self::default()
        }
    }
}

/// Entry handed to the worker pool at batch start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedJob {
    pub id: JobId,
    pub url: String,
}

/// Batch-wide view of the playlist item currently being downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistSummary {
    pub index: u32,
    pub total: u32,
    pub title: String,
}
