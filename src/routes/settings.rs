use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{error::Result, AppState};

pub async fn get_encryption_key(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "key": state.encryption_key.as_ref() }))
}

pub async fn get_system_prompt(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let prompt = state.prompt_service.load_system_prompt().await?;
    Ok(Json(json!({ "systemPrompt": prompt })))
}

/// Question types available in the demo dataset, plus the dataset itself
/// for the front end's preview.
pub async fn get_question_types(State(state): State<AppState>) -> impl IntoResponse {
    match state.prompt_service.load_demo_dataset().await {
        Ok(dataset) => {
            let types = state.prompt_service.question_types(&dataset);
            Json(json!({ "questionTypes": types, "sampleData": dataset }))
        }
        Err(e) => {
            tracing::warn!(error = ?e, "Failed to load demo dataset");
            Json(json!({ "error": e.to_string(), "questionTypes": [], "sampleData": {} }))
        }
    }
}
