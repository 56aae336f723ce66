use infinito_llm::{GenerationOptions, GenerationRequest, Generator, GeneratorConfig, ResponseStyle};
use infinito_persist::{Generation, GenerationStore, NewGeneration, RootId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, ThreadError};
use crate::pending::PendingWrites;
use crate::root_cell::RootCell;

pub const DEFAULT_EXPANSION_MAX_TOKENS: u32 = 700;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Upper token budget for one continuation; always sent
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Deferral before the store write, so the caller renders first
    #[serde(default = "default_persist_delay_ms")]
    pub persist_delay_ms: u64,
}

fn default_max_tokens() -> u32 {
    DEFAULT_EXPANSION_MAX_TOKENS
}

fn default_persist_delay_ms() -> u64 {
    10
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            persist_delay_ms: default_persist_delay_ms(),
        }
    }
}

impl ExpansionConfig {
    pub fn persist_delay(&self) -> Duration {
        Duration::from_millis(self.persist_delay_ms)
    }
}

/// Follow-up prompt asking for a bounded, paragraph-formatted continuation
pub fn expansion_prompt(topic: &str) -> String {
    format!(
        "Explain more about \"{topic}\". Go deeper with examples and practical detail.\n\n\
         Answer in 3 to 4 paragraphs. Separate paragraphs with a blank line \
         (two line breaks) and do not repeat the original answer."
    )
}

/// Outcome of a detached expansion write
#[derive(Debug, Clone, PartialEq)]
pub enum PersistReport {
    Saved { id: String, root_id: RootId },
    Failed { topic: String, error: String },
}

/// Handle to the detached store write of one expansion.
///
/// Dropping it does not cancel the write.
#[derive(Debug)]
pub struct PendingPersist {
    handle: JoinHandle<Result<Generation>>,
}

impl PendingPersist {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the write; mostly for tests and shutdown
    pub async fn wait(self) -> Result<Generation> {
        self.handle
            .await
            .map_err(|e| ThreadError::PersistenceFailed(format!("persist task failed: {e}")))?
    }
}

/// Continuation text, already final, plus its pending store write
#[derive(Debug)]
pub struct Expansion {
    pub topic: String,
    pub text: String,
    pub persistence: PendingPersist,
}

/// Requests bounded continuations and attaches them to the current root
#[derive(Clone)]
pub struct ExpansionService {
    generator: Arc<dyn Generator>,
    store: Arc<dyn GenerationStore>,
    root: RootCell,
    generator_config: GeneratorConfig,
    config: ExpansionConfig,
    reports: Option<mpsc::UnboundedSender<PersistReport>>,
    pending: PendingWrites,
}

impl ExpansionService {
    pub fn new(
        generator: Arc<dyn Generator>,
        store: Arc<dyn GenerationStore>,
        root: RootCell,
        generator_config: GeneratorConfig,
        config: ExpansionConfig,
    ) -> Self {
        Self {
            generator,
            store,
            root,
            generator_config,
            config,
            reports: None,
            pending: PendingWrites::new(),
        }
    }

    /// Also send every persistence outcome to `tx`
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<PersistReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Track writes on a barrier shared with an `EditCoordinator`
    pub fn with_pending_writes(mut self, pending: PendingWrites) -> Self {
        self.pending = pending;
        self
    }

    pub fn pending_writes(&self) -> &PendingWrites {
        &self.pending
    }

    pub fn root(&self) -> &RootCell {
        &self.root
    }

    pub fn request_for(&self, topic: &str) -> GenerationRequest {
        let mut options = GenerationOptions::new()
            .max_tokens(self.config.max_tokens)
            .response_style(ResponseStyle::Detailed);
        options.temperature = self.generator_config.temperature;
        options.top_k = self.generator_config.top_k;

        GenerationRequest::new(self.generator_config.model.clone(), expansion_prompt(topic))
            .with_options(options)
    }

    /// Generate a continuation for `topic` and schedule its persistence.
    ///
    /// Returns as soon as the text is complete; the store write runs on a
    /// detached task that reads the root id from the cell when it runs.
    pub async fn expand(&self, topic: &str) -> Result<Expansion> {
        let request = self.request_for(topic);
        tracing::debug!(topic = %topic, max_tokens = self.config.max_tokens, "Requesting expansion");

        let completion = self.generator.generate(request).await?;
        if completion.text.trim().is_empty() {
            return Err(ThreadError::GenerationFailed(
                "generator returned an empty continuation".to_string(),
            ));
        }
        if let Some(error) = completion.interruption() {
            tracing::warn!(topic = %topic, error = %error, "Expansion stream interrupted, keeping partial text");
        }

        let persistence = self
            .spawn_persist(topic.to_string(), completion.text.clone())
            .await;

        Ok(Expansion {
            topic: topic.to_string(),
            text: completion.text,
            persistence,
        })
    }

    /// Wait until every scheduled expansion write has finished
    pub async fn settle(&self) {
        self.pending.settle().await;
    }

    async fn spawn_persist(&self, topic: String, text: String) -> PendingPersist {
        let store = Arc::clone(&self.store);
        let root = self.root.clone();
        let delay = self.config.persist_delay();
        let reports = self.reports.clone();
        let record = RecordTemplate {
            model: self.generator_config.model.clone(),
            temperature: self.generator_config.temperature,
            top_k: self.generator_config.top_k,
        };
        // Taken before spawning so `settle` cannot miss this write
        let permit = self.pending.track().await;

        let handle = tokio::spawn(async move {
            let _permit = permit;
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }

            let result = persist_expansion(store.as_ref(), &root, &topic, text, record).await;
            let report = match &result {
                Ok(generation) => {
                    tracing::info!(
                        generation_id = %generation.id,
                        root_id = ?generation.parent_id,
                        position = generation.thread_position,
                        "Expansion persisted"
                    );
                    PersistReport::Saved {
                        id: generation.id.clone(),
                        root_id: generation.root_id(),
                    }
                }
                Err(e) => {
                    tracing::error!(topic = %topic, error = %e, "Failed to persist expansion");
                    PersistReport::Failed {
                        topic: topic.clone(),
                        error: e.to_string(),
                    }
                }
            };

            if let Some(tx) = reports {
                let _ = tx.send(report);
            }
            result
        });

        PendingPersist { handle }
    }
}

struct RecordTemplate {
    model: String,
    temperature: Option<f32>,
    top_k: Option<u32>,
}

async fn persist_expansion(
    store: &dyn GenerationStore,
    root: &RootCell,
    topic: &str,
    text: String,
    record: RecordTemplate,
) -> Result<Generation> {
    let root_id = root
        .current()
        .ok_or_else(|| ThreadError::PersistenceFailed("no root id for expansion".to_string()))?;

    let new = NewGeneration::expansion(&root_id, topic, text, record.model)
        .with_temperature(record.temperature)
        .with_top_k(record.top_k);

    let id = store
        .create(new)
        .await
        .map_err(|e| ThreadError::PersistenceFailed(e.to_string()))?;

    store
        .get(&id)
        .await
        .map_err(|e| ThreadError::PersistenceFailed(e.to_string()))?
        .ok_or_else(|| ThreadError::PersistenceFailed(format!("expansion {id} vanished after create")))
}
