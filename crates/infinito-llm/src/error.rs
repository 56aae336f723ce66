use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Transport broke before any fragment was observed.
    #[error("Stream failed: {0}")]
    StreamFailed(String),

    /// The generator refused or errored; no text was produced.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;
