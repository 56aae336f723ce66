use infinito_persist::{GenerationStore, RootId, ThreadResolver};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::pending::PendingWrites;

/// Result of committing an edit. A partial collapse is still a success: the
/// root holds the edited text, only cleanup is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Single-record thread, root updated in place
    Updated { root_id: RootId },
    /// Root updated and every expansion deleted
    Collapsed { root_id: RootId, removed: Vec<String> },
    /// Root updated; `orphaned` expansions could not be deleted. Committing
    /// again converges.
    PartialCollapse {
        root_id: RootId,
        removed: Vec<String>,
        orphaned: Vec<String>,
    },
}

impl CommitOutcome {
    pub fn root_id(&self) -> &RootId {
        match self {
            CommitOutcome::Updated { root_id }
            | CommitOutcome::Collapsed { root_id, .. }
            | CommitOutcome::PartialCollapse { root_id, .. } => root_id,
        }
    }

    pub fn orphaned(&self) -> &[String] {
        match self {
            CommitOutcome::PartialCollapse { orphaned, .. } => orphaned,
            _ => &[],
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, CommitOutcome::PartialCollapse { .. })
    }
}

/// Collapses a thread into its edited root. Commits are single-flight per root.
pub struct EditCoordinator {
    store: Arc<dyn GenerationStore>,
    resolver: ThreadResolver,
    in_flight: Mutex<HashMap<RootId, Arc<Mutex<()>>>>,
    pending: PendingWrites,
}

impl EditCoordinator {
    pub fn new(store: Arc<dyn GenerationStore>) -> Self {
        Self {
            resolver: ThreadResolver::new(Arc::clone(&store)),
            store,
            in_flight: Mutex::new(HashMap::new()),
            pending: PendingWrites::new(),
        }
    }

    /// Wait on these expansion writes before collapsing, so none lands on
    /// an already collapsed thread
    pub fn with_pending_writes(mut self, pending: PendingWrites) -> Self {
        self.pending = pending;
        self
    }

    /// Replace the thread behind `id` (root or expansion) with `new_output`.
    ///
    /// The root is patched before anything is deleted; if that fails the
    /// thread is left untouched and the error returned.
    pub async fn commit_edit(&self, id: &str, new_output: &str) -> Result<CommitOutcome> {
        self.pending.settle().await;
        let root_id = self.resolver.resolve(id).await?.root_id();

        let lock = self.flight_lock(&root_id).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.collapse(&root_id, new_output).await
        };
        self.release(&root_id, lock).await;

        outcome
    }

    async fn collapse(&self, root_id: &RootId, new_output: &str) -> Result<CommitOutcome> {
        // Re-read under the lock; an earlier commit may have changed the thread
        let thread = self.resolver.resolve(root_id.as_str()).await?;

        self.store.patch_output(root_id.as_str(), new_output).await?;

        if thread.is_collapsed() {
            tracing::info!(root_id = %root_id, "Edited single-record thread");
            return Ok(CommitOutcome::Updated {
                root_id: root_id.clone(),
            });
        }

        let mut removed = Vec::new();
        let mut orphaned = Vec::new();
        for expansion_id in thread.expansion_ids() {
            match self.store.delete(&expansion_id).await {
                Ok(_) => removed.push(expansion_id),
                Err(e) => {
                    tracing::warn!(
                        root_id = %root_id,
                        expansion_id = %expansion_id,
                        error = %e,
                        "Failed to delete expansion during collapse"
                    );
                    orphaned.push(expansion_id);
                }
            }
        }

        if orphaned.is_empty() {
            tracing::info!(root_id = %root_id, removed = removed.len(), "Thread collapsed");
            Ok(CommitOutcome::Collapsed {
                root_id: root_id.clone(),
                removed,
            })
        } else {
            tracing::error!(
                root_id = %root_id,
                orphaned = orphaned.len(),
                "Partial collapse: root updated, expansions left behind"
            );
            Ok(CommitOutcome::PartialCollapse {
                root_id: root_id.clone(),
                removed,
                orphaned,
            })
        }
    }

    async fn flight_lock(&self, root_id: &RootId) -> Arc<Mutex<()>> {
        let mut map = self.in_flight.lock().await;
        Arc::clone(map.entry(root_id.clone()).or_default())
    }

    async fn release(&self, root_id: &RootId, lock: Arc<Mutex<()>>) {
        let mut map = self.in_flight.lock().await;
        // Only the map and this caller still hold it: nobody is waiting
        if Arc::strong_count(&lock) <= 2 {
            map.remove(root_id);
        }
    }
}
