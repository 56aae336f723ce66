use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};

/// Barrier over detached expansion writes.
///
/// Every write holds a permit until it finishes; `settle` waits until none
/// are outstanding. Clones share the same barrier, so one instance can be
/// handed to the expansion side and the edit side of the same store.
#[derive(Clone, Default)]
pub struct PendingWrites {
    gate: Arc<RwLock<()>>,
}

/// Held by one in-flight write
pub struct WritePermit {
    _guard: OwnedRwLockReadGuard<()>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a write. Waits only while a `settle` holds the barrier.
    pub async fn track(&self) -> WritePermit {
        WritePermit {
            _guard: Arc::clone(&self.gate).read_owned().await,
        }
    }

    /// Wait until every write registered so far has finished
    pub async fn settle(&self) {
        let _barrier = self.gate.write().await;
    }
}
