#![allow(dead_code)]

use async_trait::async_trait;
use infinito_llm::{
    FinishReason, FragmentStream, GenerationRequest, Generator, Result as StreamResult,
    StreamError, StreamEvent,
};
use infinito_persist::{
    Generation, GenerationStore, InMemoryStore, NewGeneration, PersistError,
    Result as PersistResult,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// One scripted generator reply
pub enum Reply {
    Text(Vec<&'static str>),
    Interrupted(Vec<&'static str>, &'static str),
    Fail(StreamError),
}

/// Generator that plays back replies in order and records every request
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate_stream(&self, request: GenerationRequest) -> StreamResult<FragmentStream> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left");

        let (pieces, finish) = match reply {
            Reply::Fail(err) => return Err(err),
            Reply::Text(pieces) => (pieces, FinishReason::Sentinel),
            Reply::Interrupted(pieces, error) => (
                pieces,
                FinishReason::Interrupted {
                    error: error.to_string(),
                },
            ),
        };

        Ok(Box::pin(async_stream::stream! {
            let mut text = String::new();
            for piece in pieces {
                text.push_str(piece);
                yield Ok(StreamEvent::Fragment { content: piece.to_string() });
            }
            yield Ok(StreamEvent::Completed { text, finish });
        }))
    }
}

/// In-memory store that fails selected operations on demand
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    fail_creates: AtomicBool,
    fail_patches: AtomicBool,
    fail_deletes: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_creates(&self, on: bool) {
        self.fail_creates.store(on, Ordering::SeqCst);
    }

    pub fn fail_patches(&self, on: bool) {
        self.fail_patches.store(on, Ordering::SeqCst);
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.fail_deletes.lock().unwrap().insert(id.to_string());
    }

    pub fn heal_deletes(&self) {
        self.fail_deletes.lock().unwrap().clear();
    }
}

fn unavailable(op: &str) -> PersistError {
    PersistError::Connection(format!("{op}: store unavailable"))
}

#[async_trait]
impl GenerationStore for FlakyStore {
    async fn create(&self, record: NewGeneration) -> PersistResult<String> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(unavailable("create"));
        }
        self.inner.create(record).await
    }

    async fn get(&self, id: &str) -> PersistResult<Option<Generation>> {
        self.inner.get(id).await
    }

    async fn children(&self, root_id: &str) -> PersistResult<Vec<Generation>> {
        self.inner.children(root_id).await
    }

    async fn patch_output(&self, id: &str, output: &str) -> PersistResult<()> {
        if self.fail_patches.load(Ordering::SeqCst) {
            return Err(unavailable("patch"));
        }
        self.inner.patch_output(id, output).await
    }

    async fn delete(&self, id: &str) -> PersistResult<bool> {
        if self.fail_deletes.lock().unwrap().contains(id) {
            return Err(unavailable("delete"));
        }
        self.inner.delete(id).await
    }
}
