//! RAII guard that ends a batch's visible lifecycle when dropped.

use std::sync::Arc;

use super::BatchState;
use crate::store::StoreHandle;

/// Clears `is_downloading` and the playlist summary when the batch that
/// created it finishes, unwinds or is dropped mid-await. A guard from an older
/// batch leaves a newer batch's state alone.
pub(super) struct BatchGuard {
    pub(super) state: Arc<BatchState>,
    pub(super) store: StoreHandle,
    pub(super) generation: u64,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        if self.state.finish(self.generation) {
            let _ = self.store.clear_playlist_summary();
        }
    }
}
