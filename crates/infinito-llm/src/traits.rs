use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::streaming::{collect_completion, Completion, FragmentStream};

/// External text generator
///
/// Produces a chunked event stream for a prompt. Implementations own the
/// transport; the engine only consumes the decoded fragments.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Streaming generation
    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream>;

    /// Non-streaming generation: the whole completion at once
    async fn generate(&self, request: GenerationRequest) -> Result<Completion> {
        let stream = self.generate_stream(request).await?;
        collect_completion(stream).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    Concise,
    #[default]
    Detailed,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    pub response_style: ResponseStyle,
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.top_k = Some(k);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn response_style(mut self, style: ResponseStyle) -> Self {
        self.response_style = style;
        self
    }
}
