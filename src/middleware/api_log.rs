use std::time::Instant;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value as JsonValue;

use crate::models::api_log::ApiLogEntry;
use crate::services::log_service::{redact_secrets, ApiLogService};

pub const MAX_LOGGED_BODY: usize = 50 * 1024 * 1024;

/// Records every call into the API log. Only JSON response bodies are
/// buffered; streams and files are logged by content type.
pub async fn api_log_middleware(
    State(log): State<ApiLogService>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let (parts, body) = req.into_parts();
    let request_bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => return (StatusCode::PAYLOAD_TOO_LARGE, "request_body_too_large").into_response(),
    };
    let request_body = body_for_log(&request_bytes);
    let req = Request::from_parts(parts, Body::from(request_bytes));

    let response = next.run(req).await;
    let status = response.status().as_u16();

    let (response, response_body) = if is_json(response.headers()) {
        let (parts, body) = response.into_parts();
        match to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                let logged = body_for_log(&bytes);
                (Response::from_parts(parts, Body::from(bytes)), logged)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to buffer response body for logging");
                (Response::from_parts(parts, Body::empty()), None)
            }
        }
    } else {
        let placeholder = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| JsonValue::String(format!("<{}>", ct)));
        (response, placeholder)
    };

    let entry = ApiLogEntry {
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        method,
        path,
        status,
        duration_ms: started.elapsed().as_millis() as u64,
        request: request_body,
        response: response_body,
    };
    // Best effort; the response does not wait for the log file.
    tokio::spawn(async move {
        if let Err(e) = log.record(entry).await {
            tracing::warn!(error = ?e, "Failed to write API log");
        }
    });

    response
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

// Bodies that are not JSON cannot be redacted, so only their size is kept.
fn body_for_log(bytes: &Bytes) -> Option<JsonValue> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<JsonValue>(bytes) {
        Ok(value) => Some(redact_secrets(value)),
        Err(_) => Some(JsonValue::String(format!("<unparseable body, {} bytes>", bytes.len()))),
    }
}
