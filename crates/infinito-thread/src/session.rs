use futures::StreamExt;
use infinito_llm::{Completion, Generator, GeneratorConfig, StreamEvent};
use infinito_persist::{GenerationStore, NewGeneration, RootId, Thread, ThreadResolver};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::coordinator::{CommitOutcome, EditCoordinator};
use crate::error::{Result, ThreadError};
use crate::expansion::{Expansion, ExpansionConfig, ExpansionService, PersistReport};
use crate::pending::PendingWrites;
use crate::root_cell::RootCell;
use crate::splitter::{split, topic_from, Disclosure};
use crate::view::ThreadView;

/// Completed root answer
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub disclosure: Disclosure,
    /// `None` when the answer was shown but could not be stored
    pub root_id: Option<RootId>,
    /// Transport error reported after partial text
    pub interruption: Option<String>,
}

/// One conversation view: ask, show more, edit, reopen.
pub struct ThreadSession {
    generator: Arc<dyn Generator>,
    store: Arc<dyn GenerationStore>,
    generator_config: GeneratorConfig,
    root: RootCell,
    view: ThreadView,
    expansions: ExpansionService,
    coordinator: Arc<EditCoordinator>,
    resolver: ThreadResolver,
}

impl ThreadSession {
    pub fn new(
        generator: Arc<dyn Generator>,
        store: Arc<dyn GenerationStore>,
        generator_config: GeneratorConfig,
        expansion_config: ExpansionConfig,
    ) -> Self {
        let root = RootCell::new();
        let pending = PendingWrites::new();
        let expansions = ExpansionService::new(
            Arc::clone(&generator),
            Arc::clone(&store),
            root.clone(),
            generator_config.clone(),
            expansion_config,
        )
        .with_pending_writes(pending.clone());
        let coordinator = EditCoordinator::new(Arc::clone(&store)).with_pending_writes(pending);
        Self {
            coordinator: Arc::new(coordinator),
            resolver: ThreadResolver::new(Arc::clone(&store)),
            generator,
            store,
            generator_config,
            root,
            view: ThreadView::new(),
            expansions,
        }
    }

    /// Share one coordinator across sessions so commits on the same root
    /// serialize. `pending` must be the barrier that coordinator waits on.
    pub fn with_coordinator(
        mut self,
        coordinator: Arc<EditCoordinator>,
        pending: PendingWrites,
    ) -> Self {
        self.coordinator = coordinator;
        self.expansions = self.expansions.with_pending_writes(pending);
        self
    }

    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<PersistReport>) -> Self {
        self.expansions = self.expansions.with_reports(tx);
        self
    }

    pub fn root(&self) -> &RootCell {
        &self.root
    }

    pub fn view(&self) -> &ThreadView {
        &self.view
    }

    /// Stream the answer to `prompt`, calling `on_fragment` for each piece.
    ///
    /// The root record is created once the text is complete and its id goes
    /// into the root cell immediately. Dropping the returned future stops the
    /// stream and releases the transport.
    pub async fn ask<F>(&mut self, prompt: &str, mut on_fragment: F) -> Result<Answer>
    where
        F: FnMut(&str) + Send,
    {
        // Expansions of the previous answer still read the current root
        self.expansions.settle().await;
        self.root.clear();
        self.view.clear();

        let request = self.generator_config.request(prompt);
        let mut stream = self.generator.generate_stream(request).await?;

        let mut completion = None;
        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Fragment { content } => {
                    self.view.push_fragment(&content);
                    on_fragment(&content);
                }
                StreamEvent::Completed { text, finish } => {
                    completion = Some(Completion { text, finish });
                }
            }
        }

        let completion = completion
            .ok_or_else(|| ThreadError::StreamFailed("stream ended without completion".to_string()))?;
        if completion.text.trim().is_empty() {
            return Err(ThreadError::GenerationFailed("empty answer".to_string()));
        }
        let interruption = completion.interruption().map(String::from);

        self.view.show_answer(&completion.text);
        let disclosure = split(&completion.text);

        let record = NewGeneration::root(prompt, completion.text.clone(), &self.generator_config.model)
            .with_temperature(self.generator_config.temperature)
            .with_top_k(self.generator_config.top_k);

        let root_id = match self.store.create(record).await {
            Ok(id) => {
                let root_id = RootId::new(id);
                self.root.set(root_id.clone());
                tracing::info!(root_id = %root_id, "Answer stored");
                Some(root_id)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to store answer, keeping it on screen");
                None
            }
        };

        Ok(Answer {
            text: completion.text,
            disclosure,
            root_id,
            interruption,
        })
    }

    /// Append a bounded continuation of the current concise text
    pub async fn show_more(&mut self) -> Result<Expansion> {
        if self.view.answer().is_empty() {
            return Err(ThreadError::NoActiveThread);
        }
        let topic = topic_from(&self.view.disclosure().concise);
        let expansion = self.expansions.expand(&topic).await?;
        self.view.append_expansion(&expansion.text);
        Ok(expansion)
    }

    /// Replace the whole visible thread with `new_text`
    pub async fn commit_edit(&mut self, new_text: &str) -> Result<CommitOutcome> {
        let root_id = self.root.current().ok_or(ThreadError::NoActiveThread)?;

        // Expansion writes still in flight would land after the collapse
        self.expansions.settle().await;

        let outcome = self.coordinator.commit_edit(root_id.as_str(), new_text).await?;
        self.view.replace(new_text);
        Ok(outcome)
    }

    /// Load a stored thread by any of its ids and make it current
    pub async fn open(&mut self, any_id: &str) -> Result<Thread> {
        self.expansions.settle().await;
        let thread = self.resolver.resolve(any_id).await?;
        self.root.set(thread.root_id());
        self.view = ThreadView::from_thread(&thread);
        Ok(thread)
    }
}
