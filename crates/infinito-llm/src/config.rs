use serde::{Deserialize, Serialize};

use crate::traits::{GenerationOptions, GenerationRequest};

pub const DEFAULT_MODEL: &str = "mini_llm";

/// Where and how to reach the external generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Generate-stream endpoint (POST, answers with `text/event-stream`)
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Bearer token (from ENV, never serialized)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/generate-stream".to_string(),
            model: default_model(),
            temperature: Some(0.7),
            top_k: None,
            max_tokens: Some(512),
            api_key: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Generation options carrying the configured sampling parameters
    pub fn default_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            top_k: self.top_k,
            max_tokens: self.max_tokens,
            ..GenerationOptions::default()
        }
    }

    /// Request for a user prompt with the configured model and options
    pub fn request(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(self.model.clone(), prompt).with_options(self.default_options())
    }
}
