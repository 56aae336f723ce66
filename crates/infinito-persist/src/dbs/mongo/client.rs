use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use super::models::MongoGeneration;
use crate::error::{PersistError, Result};
use crate::models::{Generation, NewGeneration};
use crate::store::GenerationStore;

/// MongoDB-backed generation store (`generations` collection)
#[derive(Clone)]
pub struct MongoGenerationStore {
    collection: Collection<MongoGeneration>,
}

impl MongoGenerationStore {
    /// Connect to MongoDB and create the store
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        Ok(Self::new(&client, database))
    }

    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("generations");
        Self { collection }
    }
}

#[async_trait]
impl GenerationStore for MongoGenerationStore {
    async fn create(&self, record: NewGeneration) -> Result<String> {
        record.validate()?;

        let thread_position = match record.parent_id.as_deref() {
            None => 0,
            Some(parent_id) => {
                let parent = self
                    .collection
                    .find_one(doc! { "_id": parent_id })
                    .await?
                    .ok_or_else(|| PersistError::GenerationNotFound(parent_id.to_string()))?;
                if parent.parent_id.is_some() {
                    return Err(PersistError::InvalidRecord(format!(
                        "parent {} is not a thread root",
                        parent_id
                    )));
                }
                let siblings = self
                    .collection
                    .count_documents(doc! { "parent_id": parent_id })
                    .await?;
                siblings as u32 + 1
            }
        };

        let id = uuid::Uuid::new_v4().to_string();
        let generation = record.into_generation(id.clone(), Utc::now(), thread_position);

        self.collection
            .insert_one(MongoGeneration::from(generation))
            .await?;
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Generation>> {
        let found = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(found.map(Into::into))
    }

    async fn children(&self, root_id: &str) -> Result<Vec<Generation>> {
        let children: Vec<MongoGeneration> = self
            .collection
            .find(doc! { "parent_id": root_id })
            .sort(doc! { "thread_position": 1, "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(children.into_iter().map(Into::into).collect())
    }

    async fn patch_output(&self, id: &str, output: &str) -> Result<()> {
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "output": output } })
            .await?;
        if result.matched_count == 0 {
            return Err(PersistError::GenerationNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .delete_many(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}
