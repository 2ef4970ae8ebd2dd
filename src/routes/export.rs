use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use crate::{
    dto::generation_dto::ExportQuestionsPayload,
    error::{Error, Result},
    services::export_service::{ExportService, EXPORT_FILENAME},
    AppState,
};

/// Export generated questions as an XLSX question bank
pub async fn export_questions(
    State(state): State<AppState>,
    Json(payload): Json<ExportQuestionsPayload>,
) -> Result<impl IntoResponse> {
    let schema = state.schema.clone();
    let buffer = tokio::task::spawn_blocking(move || {
        ExportService::generate_questions_xlsx(&schema, &payload.questions)
    })
    .await
    .map_err(|e| Error::Internal(format!("Export task failed: {}", e)))??;

    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILENAME);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
