use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::{Result, StreamError};

/// Lazy sequence of decoded fragments for one in-flight answer
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Decoded text, streamed token-by-token
    Fragment {
        content: String,
    },

    /// Final value: every fragment concatenated
    Completed {
        text: String,
        finish: FinishReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FinishReason {
    /// `[DONE]` sentinel observed
    Sentinel,
    /// Transport closed without a sentinel
    Closed,
    /// Transport failed after partial text was received
    Interrupted { error: String },
}

/// Completed answer text plus how the stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub finish: FinishReason,
}

impl Completion {
    /// Transport error reported alongside partial text, if any
    pub fn interruption(&self) -> Option<&str> {
        match &self.finish {
            FinishReason::Interrupted { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Drain a fragment stream and return its completion
pub async fn collect_completion(mut stream: FragmentStream) -> Result<Completion> {
    while let Some(event) = stream.next().await {
        if let StreamEvent::Completed { text, finish } = event? {
            return Ok(Completion { text, finish });
        }
    }

    Err(StreamError::StreamFailed(
        "stream ended without a completion".to_string(),
    ))
}
