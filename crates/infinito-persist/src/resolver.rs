use std::sync::Arc;

use crate::error::{PersistError, Result};
use crate::models::{Generation, RootId};
use crate::store::GenerationStore;

/// Separator placed between thread records when they are rendered together
pub const THREAD_SEPARATOR: &str = "\n\n";

/// Ordered thread view: root first, then expansions by thread position.
///
/// Derived from the store on demand, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    records: Vec<Generation>,
}

impl Thread {
    fn new(root: Generation, mut expansions: Vec<Generation>) -> Self {
        expansions.sort_by(|a, b| {
            a.thread_position
                .cmp(&b.thread_position)
                .then(a.created_at.cmp(&b.created_at))
        });

        let mut records = Vec::with_capacity(expansions.len() + 1);
        records.push(root);
        records.extend(expansions);
        Self { records }
    }

    pub fn root(&self) -> &Generation {
        &self.records[0]
    }

    pub fn root_id(&self) -> RootId {
        self.root().root_id()
    }

    pub fn expansions(&self) -> &[Generation] {
        &self.records[1..]
    }

    pub fn records(&self) -> &[Generation] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Generation> {
        self.records
    }

    /// Root plus expansions; never zero
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True once the thread is down to its root alone
    pub fn is_collapsed(&self) -> bool {
        self.records.len() == 1
    }

    /// Ids of every non-root record
    pub fn expansion_ids(&self) -> Vec<String> {
        self.expansions().iter().map(|g| g.id.clone()).collect()
    }

    /// What the user sees: every output in thread order
    pub fn rendered_text(&self) -> String {
        self.records
            .iter()
            .map(|g| g.output.as_str())
            .collect::<Vec<_>>()
            .join(THREAD_SEPARATOR)
    }
}

/// Rebuild the thread that `any_id` belongs to.
///
/// `any_id` may name the root or one of its expansions. Fails with
/// `GenerationNotFound` when the record, or the root it points at, is gone.
pub async fn resolve_thread<S>(store: &S, any_id: &str) -> Result<Thread>
where
    S: GenerationStore + ?Sized,
{
    let record = store
        .get(any_id)
        .await?
        .ok_or_else(|| PersistError::GenerationNotFound(any_id.to_string()))?;

    let root = match record.parent_id.as_deref() {
        None => record,
        Some(parent_id) => {
            let parent = store
                .get(parent_id)
                .await?
                .ok_or_else(|| PersistError::GenerationNotFound(any_id.to_string()))?;
            if !parent.is_root() {
                return Err(PersistError::InvalidRecord(format!(
                    "{} is nested under expansion {}",
                    any_id, parent.id
                )));
            }
            parent
        }
    };

    let expansions = store.children(&root.id).await?;

    tracing::debug!(root_id = %root.id, expansions = expansions.len(), "resolved thread");

    Ok(Thread::new(root, expansions))
}

/// Thread Resolver bound to a shared store
#[derive(Clone)]
pub struct ThreadResolver {
    store: Arc<dyn GenerationStore>,
}

impl ThreadResolver {
    pub fn new(store: Arc<dyn GenerationStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, any_id: &str) -> Result<Thread> {
        resolve_thread(self.store.as_ref(), any_id).await
    }
}
