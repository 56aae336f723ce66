use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{Generation, NewGeneration};
use crate::store::GenerationStore;

#[derive(Default)]
struct Records {
    by_id: HashMap<String, Generation>,
    last_created: Option<DateTime<Utc>>,
}

impl Records {
    /// Creation timestamps never repeat or go backwards
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }
}

/// Process-local generation store
///
/// Used for development, tests, and single-node deployments without MongoDB.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Records>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.by_id.is_empty()
    }
}

#[async_trait]
impl GenerationStore for InMemoryStore {
    async fn create(&self, record: NewGeneration) -> Result<String> {
        record.validate()?;

        let mut records = self.records.write().await;

        let thread_position = match record.parent_id.as_deref() {
            None => 0,
            Some(parent_id) => {
                let parent = records
                    .by_id
                    .get(parent_id)
                    .ok_or_else(|| PersistError::GenerationNotFound(parent_id.to_string()))?;
                if !parent.is_root() {
                    return Err(PersistError::InvalidRecord(format!(
                        "parent {} is not a thread root",
                        parent_id
                    )));
                }
                let siblings = records
                    .by_id
                    .values()
                    .filter(|g| g.parent_id.as_deref() == Some(parent_id))
                    .count();
                siblings as u32 + 1
            }
        };

        let id = uuid::Uuid::new_v4().to_string();
        let created_at = records.next_timestamp();
        let generation = record.into_generation(id.clone(), created_at, thread_position);

        records.by_id.insert(id.clone(), generation);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Generation>> {
        Ok(self.records.read().await.by_id.get(id).cloned())
    }

    async fn children(&self, root_id: &str) -> Result<Vec<Generation>> {
        let records = self.records.read().await;
        let mut children: Vec<Generation> = records
            .by_id
            .values()
            .filter(|g| g.parent_id.as_deref() == Some(root_id))
            .cloned()
            .collect();
        children.sort_by_key(|g| (g.thread_position, g.created_at));
        Ok(children)
    }

    async fn patch_output(&self, id: &str, output: &str) -> Result<()> {
        let mut records = self.records.write().await;
        let generation = records
            .by_id
            .get_mut(id)
            .ok_or_else(|| PersistError::GenerationNotFound(id.to_string()))?;
        generation.output = output.to_string();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.records.write().await.by_id.remove(id).is_some())
    }
}
