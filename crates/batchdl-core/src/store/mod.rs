//! In-memory job store.
//!
//! [`JobStore`] is the ordered job collection (oldest first) plus the
//! batch-wide playlist summary. At runtime it is owned by a single actor task;
//! workers, the progress aggregator and callers all go through a cloneable
//! [`StoreHandle`], so every mutation is applied whole and in arrival order.

mod actor;
mod command;

pub use actor::StoreHandle;

use crate::job::{Job, JobId, JobPatch, JobStatus, PlaylistSummary, QueuedJob};
use crate::progress::ProgressEvent;
use crate::url_model;

/// The store actor has shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("job store is closed")]
pub struct StoreError;

/// Ordered collection of jobs. Insertion order is preserved.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: Vec<Job>,
    last_id: u64,
    playlist_summary: Option<PlaylistSummary>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every acceptable, not-yet-present URL as a pending job.
    /// Blank lines, `#` comments, non-URLs and duplicates are dropped silently.
    /// Returns the number of jobs added.
    pub fn add<I, S>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for line in lines {
            let Some(url) = url_model::accepted_url(line.as_ref()) else {
                continue;
            };
            if self.contains_url(url) {
                continue;
            }
            self.last_id += 1;
            self.jobs.push(Job::new(JobId::from(self.last_id), url.to_string()));
            added += 1;
        }
        added
    }

    /// Removes the job if present. Returns whether anything was removed.
    pub fn remove(&mut self, id: JobId) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id != id);
        self.jobs.len() != before
    }

    pub fn clear_all(&mut self) {
        self.jobs.clear();
        self.playlist_summary = None;
    }

    /// Drops completed jobs. Not guarded against a running batch; callers check first.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.status != JobStatus::Completed);
        before - self.jobs.len()
    }

    /// Merges `patch` into the job. Unknown ids are a no-op (returns false).
    pub fn patch(&mut self, id: JobId, patch: &JobPatch) -> bool {
        match self.get_mut(id) {
            Some(job) => job.apply(patch),
            None => false,
        }
    }

    /// Marks a `Pending` job `Downloading` for the worker about to run it.
    /// Returns false if the job is gone or some other worker already took it.
    pub fn claim(&mut self, id: JobId) -> bool {
        match self.get_mut(id) {
            Some(job) if job.status == JobStatus::Pending => job.apply(&JobPatch::started()),
            _ => false,
        }
    }

    /// Applies a progress notification. Notifications for unknown ids, and
    /// ones the job's current status does not accept (see
    /// [`ProgressEvent::applies_to`]), are dropped. A full playlist position
    /// also replaces the playlist summary.
    pub fn apply_progress(&mut self, event: &ProgressEvent) -> bool {
        let Some(job) = self.get_mut(event.id) else {
            tracing::trace!(job_id = %event.id, "dropping progress for unknown job");
            return false;
        };
        if !event.applies_to(job.status) {
            tracing::trace!(job_id = %event.id, status = %job.status, "dropping stale progress");
            return false;
        }
        let applied = job.apply(&event.to_patch());
        if let Some((index, total)) = event.playlist_position() {
            let title = job.title.clone();
            self.playlist_summary = Some(PlaylistSummary { index, total, title });
        }
        applied
    }

    /// Snapshots the eligible set for a new batch and resets it to `Pending`.
    /// Completed and in-flight jobs are untouched. Clears the playlist summary.
    pub fn begin_batch(&mut self) -> Vec<QueuedJob> {
        self.playlist_summary = None;
        self.jobs
            .iter_mut()
            .filter(|j| j.status.is_eligible())
            .map(|j| {
                j.reset_for_retry();
                QueuedJob {
                    id: j.id,
                    url: j.url.clone(),
                }
            })
            .collect()
    }

    pub fn eligible_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.status.is_eligible()).count()
    }

    pub fn clear_playlist_summary(&mut self) {
        self.playlist_summary = None;
    }

    pub fn playlist_summary(&self) -> Option<&PlaylistSummary> {
        self.playlist_summary.as_ref()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.jobs.iter().any(|j| j.url == url)
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests;
