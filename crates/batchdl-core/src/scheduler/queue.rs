//! Shared FIFO of jobs waiting for a worker.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::job::QueuedJob;

/// Batch work queue. Each entry is handed to exactly one worker.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedQueue(Arc<Mutex<VecDeque<QueuedJob>>>);

impl SharedQueue {
    pub(crate) fn new(jobs: Vec<QueuedJob>) -> Self {
        Self(Arc::new(Mutex::new(jobs.into())))
    }

    /// Takes the oldest waiting job, if any.
    pub(crate) fn pop(&self) -> Option<QueuedJob> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
