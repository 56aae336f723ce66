// HTTP client for a generate-stream endpoint

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

use crate::buffer_utils::{decode_frame_stream, RawTextDecoder};
use crate::config::GeneratorConfig;
use crate::error::{Result, StreamError};
use crate::streaming::FragmentStream;
use crate::traits::{GenerationRequest, Generator};

/// Generator reached over HTTP (POST JSON, read `text/event-stream`)
pub struct HttpGenerator {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpGenerator {
    /// Create new client for an endpoint
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        Self::build(endpoint.into(), None)
    }

    pub fn from_config(config: &GeneratorConfig) -> anyhow::Result<Self> {
        Self::build(config.endpoint.clone(), config.api_key.as_deref())
    }

    fn build(endpoint: String, api_key: Option<&str>) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .context("Invalid API key format")?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the generate-stream payload
    fn build_request_body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "prompt": request.prompt,
            "mode": request.model,
            "response_style": request.options.response_style,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(temp) = request.options.temperature {
                obj.insert("temperature".to_string(), json!(temp));
            }
            if let Some(top_k) = request.options.top_k {
                obj.insert("top_k".to_string(), json!(top_k));
            }
            if let Some(max_tokens) = request.options.max_tokens {
                obj.insert("max_tokens".to_string(), json!(max_tokens));
            }
        }

        body
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        let body = self.build_request_body(&request);

        tracing::debug!(endpoint = %self.endpoint, model = %request.model, "requesting generation");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| StreamError::StreamFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StreamError::GenerationFailed(format!(
                "generator returned {}: {}",
                status, detail
            )));
        }

        Ok(decode_frame_stream(response.bytes_stream(), RawTextDecoder))
    }
}
