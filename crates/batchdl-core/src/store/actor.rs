//! Store actor and its handle.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::command::StoreCommand;
use super::{JobStore, StoreError};
use crate::job::{Job, JobId, JobPatch, PlaylistSummary, QueuedJob};
use crate::progress::ProgressEvent;

/// Cloneable handle to the task that owns the [`JobStore`].
///
/// Mutations that need no answer are plain sends; queries await a reply.
/// Commands are handled strictly in the order they were sent from one handle.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreCommand>,
}

impl StoreHandle {
    /// Spawns an actor over an empty store. Must be called inside a Tokio runtime.
    pub fn spawn() -> Self {
        Self::spawn_with(JobStore::new())
    }

    /// Spawns an actor over an existing store.
    pub fn spawn_with(store: JobStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_store_actor(store, rx));
        Self { tx }
    }

    /// See [`JobStore::add`].
    pub async fn add<I, S>(&self, urls: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls = urls.into_iter().map(Into::into).collect();
        self.request(|reply| StoreCommand::Add { urls, reply }).await
    }

    pub fn remove(&self, id: JobId) -> Result<(), StoreError> {
        self.send(StoreCommand::Remove { id })
    }

    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.send(StoreCommand::ClearAll)
    }

    /// See [`JobStore::clear_completed`]. Returns the number removed.
    pub async fn clear_completed(&self) -> Result<usize, StoreError> {
        self.request(|reply| StoreCommand::ClearCompleted { reply }).await
    }

    pub fn patch(&self, id: JobId, patch: JobPatch) -> Result<(), StoreError> {
        self.send(StoreCommand::Patch { id, patch })
    }

    pub fn apply_progress(&self, event: ProgressEvent) -> Result<(), StoreError> {
        self.send(StoreCommand::ApplyProgress(event))
    }

    /// See [`JobStore::claim`]. Refused once `cancel` has fired, so a worker
    /// of a stopped batch cannot take a job the next batch has queued.
    pub async fn claim(&self, id: JobId, cancel: &CancellationToken) -> Result<bool, StoreError> {
        let cancel = cancel.clone();
        self.request(|reply| StoreCommand::Claim { id, cancel, reply })
            .await
    }

    /// See [`JobStore::begin_batch`].
    pub async fn begin_batch(&self) -> Result<Vec<QueuedJob>, StoreError> {
        self.request(|reply| StoreCommand::BeginBatch { reply }).await
    }

    pub fn clear_playlist_summary(&self) -> Result<(), StoreError> {
        self.send(StoreCommand::ClearPlaylistSummary)
    }

    /// All jobs in insertion order.
    pub async fn snapshot(&self) -> Result<Vec<Job>, StoreError> {
        self.request(|reply| StoreCommand::Snapshot { reply }).await
    }

    pub async fn get(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        self.request(|reply| StoreCommand::Get { id, reply }).await
    }

    pub async fn playlist_summary(&self) -> Result<Option<PlaylistSummary>, StoreError> {
        self.request(|reply| StoreCommand::PlaylistSummary { reply })
            .await
    }

    fn send(&self, cmd: StoreCommand) -> Result<(), StoreError> {
        self.tx.send(cmd).map_err(|_| StoreError)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> StoreCommand,
    ) -> Result<T, StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx))?;
        reply_rx.await.map_err(|_| StoreError)
    }
}

/// Owns the store until every handle is dropped.
async fn run_store_actor(mut store: JobStore, mut rx: mpsc::UnboundedReceiver<StoreCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::Add { urls, reply } => {
                let added = store.add(&urls);
                tracing::debug!(offered = urls.len(), added, "jobs added");
                let _ = reply.send(added);
            }
            StoreCommand::Remove { id } => {
                if store.remove(id) {
                    tracing::debug!(job_id = %id, "job removed");
                }
            }
            StoreCommand::ClearAll => store.clear_all(),
            StoreCommand::ClearCompleted { reply } => {
                let _ = reply.send(store.clear_completed());
            }
            StoreCommand::Patch { id, patch } => {
                store.patch(id, &patch);
            }
            StoreCommand::ApplyProgress(event) => {
                store.apply_progress(&event);
            }
            StoreCommand::Claim { id, cancel, reply } => {
                let claimed = !cancel.is_cancelled() && store.claim(id);
                let _ = reply.send(claimed);
            }
            StoreCommand::BeginBatch { reply } => {
                let _ = reply.send(store.begin_batch());
            }
            StoreCommand::ClearPlaylistSummary => store.clear_playlist_summary(),
            StoreCommand::Snapshot { reply } => {
                let _ = reply.send(store.jobs().to_vec());
            }
            StoreCommand::Get { id, reply } => {
                let _ = reply.send(store.get(id).cloned());
            }
            StoreCommand::PlaylistSummary { reply } => {
                let _ = reply.send(store.playlist_summary().cloned());
            }
        }
    }
    tracing::debug!("job store actor stopped");
}
