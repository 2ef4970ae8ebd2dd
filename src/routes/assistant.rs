use axum::{extract::State, response::IntoResponse, Json};
use serde_json::{json, Value as JsonValue};
use validator::Validate;

use crate::{dto::generation_dto::AssistantPayload, error::Result, AppState};

pub async fn extract_directory(
    State(state): State<AppState>,
    Json(payload): Json<AssistantPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .ai_service
        .extract_directory(&payload.chat_target(), &payload.content)
        .await;
    Ok(Json(assistant_body(outcome, "directory", "无法提取目录")))
}

pub async fn generate_filename(
    State(state): State<AppState>,
    Json(payload): Json<AssistantPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .ai_service
        .generate_filename(&payload.chat_target(), &payload.content)
        .await;
    Ok(Json(assistant_body(outcome, "filename", "无法生成文件名")))
}

// Relay failures are reported in the body, not as an HTTP error status.
fn assistant_body(outcome: Result<Option<String>>, key: &str, empty_message: &str) -> JsonValue {
    match outcome {
        Ok(Some(text)) if !text.is_empty() => {
            let mut body = serde_json::Map::new();
            body.insert(key.to_string(), JsonValue::String(text));
            JsonValue::Object(body)
        }
        Ok(_) => json!({ "error": empty_message }),
        Err(e) => {
            tracing::error!(error = ?e, "Assistant completion failed");
            json!({ "error": e.to_string() })
        }
    }
}
