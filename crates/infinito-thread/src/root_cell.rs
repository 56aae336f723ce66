use infinito_persist::RootId;
use std::sync::Arc;
use tokio::sync::watch;

/// Authoritative "current root id" for one conversation view.
///
/// Written synchronously the moment a root is known; background work reads
/// it when it runs instead of capturing an id up front.
#[derive(Clone)]
pub struct RootCell {
    inner: Arc<watch::Sender<Option<RootId>>>,
}

impl RootCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    pub fn with_root(root: RootId) -> Self {
        let cell = Self::new();
        cell.set(root);
        cell
    }

    pub fn set(&self, root: RootId) {
        self.inner.send_replace(Some(root));
    }

    pub fn clear(&self) {
        self.inner.send_replace(None);
    }

    pub fn current(&self) -> Option<RootId> {
        self.inner.borrow().clone()
    }

    /// Change notifications, for views that follow the active thread
    pub fn subscribe(&self) -> watch::Receiver<Option<RootId>> {
        self.inner.subscribe()
    }
}

impl Default for RootCell {
    fn default() -> Self {
        Self::new()
    }
}
