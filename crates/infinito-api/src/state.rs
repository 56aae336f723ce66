use infinito_llm::{Generator, GeneratorConfig};
use infinito_persist::{GenerationStore, ThreadResolver};
use infinito_thread::{EditCoordinator, ExpansionConfig, ExpansionService, PendingWrites, RootCell};
use std::sync::Arc;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GenerationStore>,
    pub generator: Arc<dyn Generator>,
    pub generator_config: GeneratorConfig,
    pub expansion_config: ExpansionConfig,
    pub resolver: ThreadResolver,
    /// One coordinator for the process, so edits to a root are single-flight
    pub coordinator: Arc<EditCoordinator>,
    /// Detached expansion writes; edits wait for them before collapsing
    pub pending: PendingWrites,
    pub store_backend: &'static str,
}

impl AppState {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        generator: Arc<dyn Generator>,
        generator_config: GeneratorConfig,
        expansion_config: ExpansionConfig,
    ) -> Self {
        let pending = PendingWrites::new();
        let coordinator =
            EditCoordinator::new(Arc::clone(&store)).with_pending_writes(pending.clone());
        Self {
            resolver: ThreadResolver::new(Arc::clone(&store)),
            coordinator: Arc::new(coordinator),
            pending,
            store,
            generator,
            generator_config,
            expansion_config,
            store_backend: "memory",
        }
    }

    pub fn with_store_backend(mut self, name: &'static str) -> Self {
        self.store_backend = name;
        self
    }

    /// Expansion service bound to one root
    pub fn expansions_for(&self, root: RootCell) -> ExpansionService {
        ExpansionService::new(
            Arc::clone(&self.generator),
            Arc::clone(&self.store),
            root,
            self.generator_config.clone(),
            self.expansion_config.clone(),
        )
        .with_pending_writes(self.pending.clone())
    }
}
