use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use infinito_persist::{Generation, NewGeneration, Thread};
use infinito_thread::{split, topic_from, CommitOutcome, Disclosure, RootCell};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateGenerationRequest {
    pub prompt: String,
    pub output: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_k: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub id: String,
    pub parent_id: Option<String>,
    pub prompt: String,
    pub output: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub thread_position: u32,
    pub is_root: bool,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub root_id: String,
    pub records: Vec<GenerationResponse>,
    /// Outputs joined in thread order, as rendered
    pub text: String,
    pub disclosure: Disclosure,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub output: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditResponse {
    pub status: String,
    pub root_id: String,
    pub removed: Vec<String>,
    pub orphaned: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpansionRequest {
    /// Defaults to the root's concise text
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpansionResponse {
    pub root_id: String,
    pub topic: String,
    pub text: String,
}

/// Create a root generation
pub async fn create_generation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGenerationRequest>,
) -> ApiResult<(StatusCode, Json<GenerationResponse>)> {
    let model = req
        .model
        .unwrap_or_else(|| state.generator_config.model.clone());
    let record = NewGeneration::root(req.prompt, req.output, model)
        .with_temperature(req.temperature)
        .with_top_k(req.top_k);

    let id = state.store.create(record).await?;
    let generation = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;

    tracing::info!(generation_id = %id, "Root generation created");
    Ok((StatusCode::CREATED, Json(generation_to_response(generation))))
}

/// Ordered thread for a root or expansion id
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state.resolver.resolve(&id).await?;
    Ok(Json(thread_to_response(thread)))
}

/// Commit an edit: the thread collapses into its root
pub async fn commit_edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<EditRequest>,
) -> ApiResult<Json<EditResponse>> {
    if req.output.trim().is_empty() {
        return Err(ApiError::BadRequest("output must not be empty".to_string()));
    }

    let outcome = state.coordinator.commit_edit(&id, &req.output).await?;
    Ok(Json(outcome_to_response(outcome)))
}

/// Delete one record; deleting a missing record succeeds
pub async fn delete_generation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let existed = state.store.delete(&id).await?;
    tracing::info!(generation_id = %id, existed, "Generation deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    if req.ids.is_empty() {
        return Err(ApiError::BadRequest("ids must not be empty".to_string()));
    }
    let deleted = state.store.delete_many(&req.ids).await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}

/// Generate an expansion and answer with its text right away.
///
/// The record is written in the background; failures are logged only.
pub async fn create_expansion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<ExpansionRequest>>,
) -> ApiResult<(StatusCode, Json<ExpansionResponse>)> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let thread = state.resolver.resolve(&id).await?;
    let root_id = thread.root_id();

    let topic = match req.topic.filter(|t| !t.trim().is_empty()) {
        Some(topic) => topic,
        None => topic_from(&split(&thread.root().output).concise),
    };

    let service = state.expansions_for(RootCell::with_root(root_id.clone()));
    let expansion = service.expand(&topic).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ExpansionResponse {
            root_id: root_id.to_string(),
            topic: expansion.topic,
            text: expansion.text,
        }),
    ))
}

fn generation_to_response(generation: Generation) -> GenerationResponse {
    GenerationResponse {
        is_root: generation.is_root(),
        id: generation.id,
        parent_id: generation.parent_id,
        prompt: generation.prompt,
        output: generation.output,
        model: generation.model,
        temperature: generation.temperature,
        top_k: generation.top_k,
        created_at: generation.created_at,
        thread_position: generation.thread_position,
    }
}

fn thread_to_response(thread: Thread) -> ThreadResponse {
    let root_id = thread.root_id().to_string();
    let text = thread.rendered_text();
    let disclosure = split(&thread.root().output);
    ThreadResponse {
        root_id,
        text,
        disclosure,
        records: thread
            .into_records()
            .into_iter()
            .map(generation_to_response)
            .collect(),
    }
}

fn outcome_to_response(outcome: CommitOutcome) -> EditResponse {
    let root_id = outcome.root_id().to_string();
    let (status, removed, orphaned) = match outcome {
        CommitOutcome::Updated { .. } => ("updated", Vec::new(), Vec::new()),
        CommitOutcome::Collapsed { removed, .. } => ("collapsed", removed, Vec::new()),
        CommitOutcome::PartialCollapse {
            removed, orphaned, ..
        } => ("partial_collapse", removed, orphaned),
    };
    EditResponse {
        status: status.to_string(),
        root_id,
        removed,
        orphaned,
    }
}
