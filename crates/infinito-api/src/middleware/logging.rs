use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// One log line per request, tagged with the generation it touches
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let generation_id = generation_id(&path).map(str::to_string);
    let started = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match generation_id {
        Some(id) => tracing::info!(
            %method,
            route = route_kind(&path),
            generation_id = %id,
            status = status.as_u16(),
            elapsed_ms,
            "generation request"
        ),
        None if status.is_server_error() => tracing::warn!(
            %method,
            %path,
            status = status.as_u16(),
            elapsed_ms,
            "request failed"
        ),
        None => tracing::debug!(%method, %path, status = status.as_u16(), elapsed_ms, "request"),
    }

    response
}

/// Id segment of `/generations/:id[/...]`
fn generation_id(path: &str) -> Option<&str> {
    let mut segments = path.trim_start_matches('/').split('/');
    if segments.next()? != "generations" {
        return None;
    }
    segments
        .next()
        .filter(|id| !id.is_empty() && *id != "bulk-delete")
}

fn route_kind(path: &str) -> &'static str {
    if path.ends_with("/thread") {
        "thread"
    } else if path.ends_with("/expansions") {
        "expansion"
    } else {
        "record"
    }
}
