use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Generation not found: {0}")]
    GenerationNotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistError::GenerationNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
