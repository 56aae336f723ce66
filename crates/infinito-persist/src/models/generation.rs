use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PersistError, Result};

/// One recorded exchange (root) or expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub id: String,
    /// Root id for expansions, None for the root itself
    pub parent_id: Option<String>,
    pub prompt: String,
    pub output: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub created_at: DateTime<Utc>,
    /// 0 for the root, 1.. for expansions in creation order
    pub thread_position: u32,
}

impl Generation {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Id of the thread root this record belongs to
    pub fn root_id(&self) -> RootId {
        RootId(self.parent_id.clone().unwrap_or_else(|| self.id.clone()))
    }
}

/// Identifier of a thread root.
///
/// Obtained from a stored record, so expansions always attach to a root and
/// never to another expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootId(String);

impl RootId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RootId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Record to create. Id, timestamp and thread position are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGeneration {
    pub parent_id: Option<String>,
    pub prompt: String,
    pub output: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
}

impl NewGeneration {
    /// Root record for a completed user prompt
    pub fn root(
        prompt: impl Into<String>,
        output: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: None,
            prompt: prompt.into(),
            output: output.into(),
            model: model.into(),
            temperature: None,
            top_k: None,
        }
    }

    /// Expansion under `root`; the topic takes the place of the prompt
    pub fn expansion(
        root: &RootId,
        topic: impl Into<String>,
        output: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: Some(root.as_str().to_string()),
            prompt: topic.into(),
            output: output.into(),
            model: model.into(),
            temperature: None,
            top_k: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }

    /// Reject records the store must never hold
    pub fn validate(&self) -> Result<()> {
        if self.output.is_empty() {
            return Err(PersistError::InvalidRecord("output is required".to_string()));
        }
        if self.parent_id.is_none() && self.prompt.trim().is_empty() {
            return Err(PersistError::InvalidRecord(
                "prompt is required for a root generation".to_string(),
            ));
        }
        Ok(())
    }

    /// Materialize into a stored record
    pub fn into_generation(
        self,
        id: String,
        created_at: DateTime<Utc>,
        thread_position: u32,
    ) -> Generation {
        Generation {
            id,
            parent_id: self.parent_id,
            prompt: self.prompt,
            output: self.output,
            model: self.model,
            temperature: self.temperature,
            top_k: self.top_k,
            created_at,
            thread_position,
        }
    }
}
