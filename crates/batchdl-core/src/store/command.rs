//! Messages understood by the store actor.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::job::{Job, JobId, JobPatch, PlaylistSummary, QueuedJob};
use crate::progress::ProgressEvent;

pub(super) enum StoreCommand {
    Add {
        urls: Vec<String>,
        reply: oneshot::Sender<usize>,
    },
    Remove {
        id: JobId,
    },
    ClearAll,
    ClearCompleted {
        reply: oneshot::Sender<usize>,
    },
    Patch {
        id: JobId,
        patch: JobPatch,
    },
    ApplyProgress(ProgressEvent),
    Claim {
        id: JobId,
        cancel: CancellationToken,
        reply: oneshot::Sender<bool>,
    },
    BeginBatch {
        reply: oneshot::Sender<Vec<QueuedJob>>,
    },
    ClearPlaylistSummary,
    Snapshot {
        reply: oneshot::Sender<Vec<Job>>,
    },
    Get {
        id: JobId,
        reply: oneshot::Sender<Option<Job>>,
    },
    PlaylistSummary {
        reply: oneshot::Sender<Option<PlaylistSummary>>,
    },
}
