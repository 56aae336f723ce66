use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use infinito_persist::PersistError;
use infinito_thread::ThreadError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Generation not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Generator error: {0}")]
    Generator(String),

    #[error("Persistence error: {0}")]
    Persist(PersistError),

    #[error("Thread error: {0}")]
    Thread(ThreadError),
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::GenerationNotFound(id) => ApiError::NotFound(id),
            PersistError::InvalidRecord(msg) => ApiError::BadRequest(msg),
            other => ApiError::Persist(other),
        }
    }
}

impl From<ThreadError> for ApiError {
    fn from(err: ThreadError) -> Self {
        match err {
            ThreadError::NotFound(id) => ApiError::NotFound(id),
            ThreadError::StreamFailed(msg) | ThreadError::GenerationFailed(msg) => {
                ApiError::Generator(msg)
            }
            ThreadError::Store(e) => ApiError::from(e),
            other => ApiError::Thread(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Generator(ref msg) => {
                tracing::warn!("Generator error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Generation failed".to_string())
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Thread(ref e) => {
                tracing::error!("Thread error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
