use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Generation;

/// MongoDB document for a generation (uuid string as `_id`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGeneration {
    #[serde(rename = "_id")]
    pub id: String,
    pub parent_id: Option<String>,
    pub prompt: String,
    pub output: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub thread_position: u32,
}

impl From<Generation> for MongoGeneration {
    fn from(g: Generation) -> Self {
        Self {
            id: g.id,
            parent_id: g.parent_id,
            prompt: g.prompt,
            output: g.output,
            model: g.model,
            temperature: g.temperature,
            top_k: g.top_k,
            created_at: g.created_at,
            thread_position: g.thread_position,
        }
    }
}

impl From<MongoGeneration> for Generation {
    fn from(g: MongoGeneration) -> Self {
        Self {
            id: g.id,
            parent_id: g.parent_id,
            prompt: g.prompt,
            output: g.output,
            model: g.model,
            temperature: g.temperature,
            top_k: g.top_k,
            created_at: g.created_at,
            thread_position: g.thread_position,
        }
    }
}
