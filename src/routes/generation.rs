use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::generation_dto::{CompareFilesPayload, GenerateQuestionsPayload},
    error::Result,
    services::ai_service::FragmentStream,
    services::prompt_service::GenerationPromptInput,
    AppState,
};

#[axum::debug_handler]
pub async fn generate_questions(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuestionsPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let prompts = state
        .prompt_service
        .generation_prompts(GenerationPromptInput {
            question_types: &payload.question_types,
            user_input: &payload.user_input,
            system_prompt: payload.system_prompt.as_deref(),
            directory: payload.directory.as_deref(),
        })
        .await;

    // Prompt assembly failures are reported in-stream like relay failures.
    let fragments: FragmentStream = match prompts {
        Ok(prompts) => {
            tracing::info!(
                model = %payload.model,
                question_types = ?payload.question_types,
                "Streaming question generation"
            );
            state
                .ai_service
                .generate_questions_stream(payload.chat_target(), prompts.system, prompts.user)
        }
        Err(e) => Box::pin(stream::once(async move { Err::<String, _>(e) })),
    };

    Ok(Sse::new(fragment_events(fragments)))
}

#[axum::debug_handler]
pub async fn compare_files(
    State(state): State<AppState>,
    Json(payload): Json<CompareFilesPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let fragments = state
        .ai_service
        .compare_files_stream(payload.chat_target(), &payload.file_a, &payload.file_b);
    Ok(Sse::new(fragment_events(fragments)))
}

/// `{"text"}` frame per fragment; the first error becomes an `{"error"}`
/// frame and ends the stream.
pub fn fragment_events(fragments: FragmentStream) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    async_stream::stream! {
        let mut fragments = fragments;
        while let Some(item) = fragments.next().await {
            match item {
                Ok(text) => yield Ok::<_, Infallible>(Event::default().data(json!({ "text": text }).to_string())),
                Err(e) => {
                    tracing::error!(error = ?e, "Completion stream failed");
                    yield Ok::<_, Infallible>(Event::default().data(json!({ "error": e.to_string() }).to_string()));
                    break;
                }
            }
        }
    }
}
