use infinito_llm::StreamError;
use infinito_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThreadError {
    /// Transport broke before anything was shown
    #[error("Stream failed: {0}")]
    StreamFailed(String),

    /// The generator refused or errored; nothing was rendered
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Thread or record is gone. Terminal for the request, never retried.
    #[error("Thread not found: {0}")]
    NotFound(String),

    /// An expansion could not be saved. Logged; the rendered text stays.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("No active thread")]
    NoActiveThread,

    #[error(transparent)]
    Store(PersistError),
}

impl From<StreamError> for ThreadError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::StreamFailed(msg) => ThreadError::StreamFailed(msg),
            StreamError::GenerationFailed(msg) => ThreadError::GenerationFailed(msg),
        }
    }
}

impl From<PersistError> for ThreadError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::GenerationNotFound(id) => ThreadError::NotFound(id),
            other => ThreadError::Store(other),
        }
    }
}

impl ThreadError {
    /// Errors raised before anything reached the screen block the interaction
    pub fn is_blocking(&self) -> bool {
        !matches!(self, ThreadError::PersistenceFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, ThreadError>;
