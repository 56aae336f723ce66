use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use infinito_api::{api_routes, state::AppState};
use infinito_llm::{
    FinishReason, FragmentStream, GenerationRequest, Generator, GeneratorConfig, StreamError,
    StreamEvent,
};
use infinito_persist::InMemoryStore;
use infinito_thread::ExpansionConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Answers every prompt with the same text, or always fails
struct FixedGenerator {
    reply: Result<&'static str, &'static str>,
}

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate_stream(
        &self,
        _request: GenerationRequest,
    ) -> infinito_llm::Result<FragmentStream> {
        let text = self
            .reply
            .map_err(|e| StreamError::GenerationFailed(e.to_string()))?;
        let events: Vec<infinito_llm::Result<StreamEvent>> = vec![
            Ok(StreamEvent::Fragment {
                content: text.to_string(),
            }),
            Ok(StreamEvent::Completed {
                text: text.to_string(),
                finish: FinishReason::Sentinel,
            }),
        ];
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

fn app_with(reply: Result<&'static str, &'static str>) -> Router {
    app_with_config(
        reply,
        ExpansionConfig {
            persist_delay_ms: 0,
            ..ExpansionConfig::default()
        },
    )
}

fn app_with_config(reply: Result<&'static str, &'static str>, expansion: ExpansionConfig) -> Router {
    let state = AppState::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(FixedGenerator { reply }),
        GeneratorConfig::default(),
        expansion,
    );
    api_routes(Arc::new(state))
}

fn app() -> Router {
    app_with(Ok("The Seine runs through Paris."))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_root(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/generations",
        Some(json!({
            "prompt": "What is the capital of France?",
            "output": "Paris is the capital of France."
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

/// Expansion writes are detached; poll until the thread reaches `len`
async fn wait_for_thread_len(app: &Router, id: &str, len: usize) -> Value {
    for _ in 0..50 {
        let (_, thread) = send(app, "GET", &format!("/generations/{id}/thread"), None).await;
        if thread["records"].as_array().map(Vec::len) == Some(len) {
            return thread;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("thread {id} never reached {len} records");
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["store"]["reachable"], true);
    assert_eq!(body["generator_model"], "mini_llm");
}

#[tokio::test]
async fn test_create_and_resolve_root() {
    let app = app();
    let id = create_root(&app).await;

    let (status, thread) = send(&app, "GET", &format!("/generations/{id}/thread"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread["root_id"], id.as_str());
    assert_eq!(thread["records"][0]["is_root"], true);
    assert_eq!(thread["records"][0]["thread_position"], 0);
    assert_eq!(thread["records"][0]["model"], "mini_llm");
    assert_eq!(thread["text"], "Paris is the capital of France.");
}

#[tokio::test]
async fn test_empty_output_is_rejected() {
    let (status, _) = send(
        &app(),
        "POST",
        "/generations",
        Some(json!({ "prompt": "q", "output": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_thread_is_404() {
    let (status, body) = send(&app(), "GET", "/generations/missing/thread", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_expansion_returns_text_then_persists() {
    let app = app();
    let id = create_root(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/generations/{id}/expansions"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["topic"], "Paris is the capital of France");
    assert_eq!(body["text"], "The Seine runs through Paris.");

    let thread = wait_for_thread_len(&app, &id, 2).await;
    assert_eq!(thread["records"][1]["parent_id"], id.as_str());
    assert_eq!(thread["records"][1]["thread_position"], 1);
    assert_eq!(
        thread["text"],
        "Paris is the capital of France.\n\nThe Seine runs through Paris."
    );
}

#[tokio::test]
async fn test_generator_failure_is_502() {
    let app = app_with(Err("[AiO Error] quota exceeded"));
    let id = create_root(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/generations/{id}/expansions"),
        Some(json!({ "topic": "Paris" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, thread) = send(&app, "GET", &format!("/generations/{id}/thread"), None).await;
    assert_eq!(thread["records"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_edit_collapses_thread() {
    let app = app();
    let id = create_root(&app).await;
    for _ in 0..2 {
        send(&app, "POST", &format!("/generations/{id}/expansions"), Some(json!({}))).await;
    }
    let thread = wait_for_thread_len(&app, &id, 3).await;
    let child = thread["records"][2]["id"].as_str().unwrap().to_string();

    let edited = "Paris, France's capital, is home to 2.1M people.";
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/generations/{child}"),
        Some(json!({ "output": edited })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "collapsed");
    assert_eq!(body["root_id"], id.as_str());
    assert_eq!(body["removed"].as_array().unwrap().len(), 2);
    assert!(body["orphaned"].as_array().unwrap().is_empty());

    let (_, thread) = send(&app, "GET", &format!("/generations/{id}/thread"), None).await;
    assert_eq!(thread["records"].as_array().unwrap().len(), 1);
    assert_eq!(thread["text"], edited);

    let (status, _) = send(&app, "GET", &format!("/generations/{child}/thread"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Committing again is a plain update
    let (_, body) = send(
        &app,
        "PATCH",
        &format!("/generations/{id}"),
        Some(json!({ "output": edited })),
    )
    .await;
    assert_eq!(body["status"], "updated");
}

#[tokio::test]
async fn test_edit_validation_and_missing_root() {
    let app = app();
    let id = create_root(&app).await;

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/generations/{id}"),
        Some(json!({ "output": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PATCH",
        "/generations/nope",
        Some(json!({ "output": "text" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deletes() {
    let app = app();
    let a = create_root(&app).await;
    let b = create_root(&app).await;

    let (status, _) = send(&app, "DELETE", &format!("/generations/{a}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    // Already gone: still a success
    let (status, _) = send(&app, "DELETE", &format!("/generations/{a}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "POST",
        "/generations/bulk-delete",
        Some(json!({ "ids": [a, b, "unknown"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);
}

#[tokio::test]
async fn test_edit_right_after_expansion_stays_collapsed() {
    // Default deferral: the expansion write is still pending when PATCH arrives
    let app = app_with_config(Ok("The Seine runs through Paris."), ExpansionConfig::default());
    let id = create_root(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/generations/{id}/expansions"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let edited = "Paris, France's capital, is home to 2.1M people.";
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/generations/{id}"),
        Some(json!({ "output": edited })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "collapsed");
    assert_eq!(body["removed"].as_array().unwrap().len(), 1);

    // Nothing is left to land after the collapse
    tokio::time::sleep(Duration::from_millis(50)).await;
    let (_, thread) = send(&app, "GET", &format!("/generations/{id}/thread"), None).await;
    assert_eq!(thread["records"].as_array().unwrap().len(), 1);
    assert_eq!(thread["text"], edited);
}
