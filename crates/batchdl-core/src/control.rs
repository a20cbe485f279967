//! Per-run cancellation for engines.
//!
//! An engine registers each run it starts and gets a [`CancellationToken`]
//! back; `cancel()` on the engine cancels every registered token. The batch
//! latch checked by workers between jobs is a plain `CancellationToken` owned
//! by the batch controller.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio_util::sync::CancellationToken;

use crate::job::JobId;

/// Running engine invocations, keyed by job id.
#[derive(Debug, Default)]
pub struct AbortRegistry {
    runs: RwLock<HashMap<JobId, CancellationToken>>,
}

impl AbortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a run; the returned guard unregisters it when dropped.
    pub fn register(&self, job_id: JobId) -> Registration<'_> {
        let token = CancellationToken::new();
        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id, token.clone());
        Registration {
            registry: self,
            job_id,
            token,
        }
    }

    /// Cancels every registered run. Returns how many were signalled.
    pub fn abort_all(&self) -> usize {
        let runs = self.runs.read().unwrap_or_else(PoisonError::into_inner);
        for token in runs.values() {
            token.cancel();
        }
        runs.len()
    }

    pub fn running(&self) -> usize {
        self.runs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn unregister(&self, job_id: JobId) {
        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&job_id);
    }
}

/// Unregisters its run from the [`AbortRegistry`] when dropped.
pub struct Registration<'a> {
    registry: &'a AbortRegistry,
    job_id: JobId,
    token: CancellationToken,
}

impl Registration<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.unregister(self.job_id);
    }
}
