//! Upload batch tracking and cancellation.
//!
//! Every call to `UploadService::upload_batch` registers a batch here. The
//! tracker hands out a [`CancelToken`] per batch and remembers the most recent
//! batch id. The batch that leaves the tracker idle schedules the delayed panel
//! clear, and the clear is dropped if another batch starts before it fires.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Unique identifier for an upload batch.
pub type BatchId = u64;

/// Token for checking and signaling batch cancellation.
///
/// Clone this token to share cancellation state across tasks.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    batch_id: BatchId,
}

impl CancelToken {
    pub fn new(batch_id: BatchId) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            batch_id,
        }
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation. Workers already in flight finish on their own.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }
}

/// Registry of running upload batches.
#[derive(Debug)]
pub struct BatchTracker {
    next_id: AtomicU64,
    /// Id of the most recently started batch (0 = none yet).
    latest: AtomicU64,
    active: RwLock<HashMap<BatchId, CancelToken>>,
}

impl Default for BatchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchTracker {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            latest: AtomicU64::new(0),
            active: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new batch and return its cancel token.
    pub fn start_batch(&self) -> CancelToken {
        let batch_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancelToken::new(batch_id);
        self.active.write().insert(batch_id, token.clone());
        self.latest.fetch_max(batch_id, Ordering::AcqRel);
        token
    }

    /// Cancel a batch by id. Returns true if the batch was still active.
    pub fn cancel_batch(&self, batch_id: BatchId) -> bool {
        match self.active.read().get(&batch_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every active batch.
    pub fn cancel_all(&self) {
        for token in self.active.read().values() {
            token.cancel();
        }
    }

    /// Stop tracking a drained batch.
    ///
    /// Returns true when this was the last active batch.
    pub fn complete_batch(&self, batch_id: BatchId) -> bool {
        let mut active = self.active.write();
        active.remove(&batch_id);
        active.is_empty()
    }

    pub fn active_batch_count(&self) -> usize {
        self.active.read().len()
    }

    pub fn is_batch_active(&self, batch_id: BatchId) -> bool {
        self.active.read().contains_key(&batch_id)
    }

    /// Id of the most recently started batch (0 = none yet).
    pub fn latest_batch(&self) -> BatchId {
        self.latest.load(Ordering::Acquire)
    }
}
