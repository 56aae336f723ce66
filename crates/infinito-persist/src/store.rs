use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Generation, NewGeneration};
use crate::resolver::resolve_thread;

/// Durable storage of generation records
///
/// Implementations provide database-specific CRUD operations. Each call
/// either succeeds or fails once; retries are the implementation's concern.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Create a record and return its id.
    ///
    /// The store assigns `created_at` and `thread_position` (0 for a root,
    /// `1 + existing expansions` for a child). A `parent_id` must name an
    /// existing root.
    async fn create(&self, record: NewGeneration) -> Result<String>;

    /// Get a record by id
    async fn get(&self, id: &str) -> Result<Option<Generation>>;

    /// All records whose `parent_id` is `root_id`, in thread order
    async fn children(&self, root_id: &str) -> Result<Vec<Generation>>;

    /// Overwrite a record's output. Fails with `GenerationNotFound` if missing.
    async fn patch_output(&self, id: &str, output: &str) -> Result<()>;

    /// Delete a record. Returns false if it was already gone.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Delete several records, returning how many were removed
    async fn delete_many(&self, ids: &[String]) -> Result<u64> {
        let mut removed = 0;
        for id in ids {
            if self.delete(id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Ordered thread (root first) for a root or expansion id
    async fn get_thread(&self, any_id: &str) -> Result<Vec<Generation>> {
        Ok(resolve_thread(self, any_id).await?.into_records())
    }
}
