pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::config::Config;
use crate::error::Result;
use crate::models::header::HeaderSchema;
use crate::services::{
    ai_service::AIService, key_service::load_or_create_key, log_service::ApiLogService,
    prompt_service::PromptService,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<HeaderSchema>,
    pub ai_service: AIService,
    pub prompt_service: PromptService,
    pub api_log: ApiLogService,
    pub encryption_key: Arc<str>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        // Timeouts are set per request by the relay.
        let http_client = Client::builder().build()?;

        let schema = Arc::new(HeaderSchema::standard());
        let ai_service = AIService::new(http_client);
        let prompt_service = PromptService::new(
            config.demo_questions_path.clone(),
            config.system_prompt_path.clone(),
            schema.clone(),
        );
        let api_log = ApiLogService::new(config.api_log_path.clone(), config.api_log_max_entries);
        let encryption_key = load_or_create_key(&config.encryption_key_path)?;

        Ok(Self {
            schema,
            ai_service,
            prompt_service,
            api_log,
            encryption_key: encryption_key.into(),
        })
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/api/encryption-key", get(routes::settings::get_encryption_key))
        .route("/api/system-prompt", get(routes::settings::get_system_prompt))
        .route("/api/question-types", get(routes::settings::get_question_types))
        .route("/api/generate", post(routes::generation::generate_questions))
        .route("/api/compare", post(routes::generation::compare_files))
        .route("/api/export", post(routes::export::export_questions))
        .route(
            "/api/extract-directory",
            post(routes::assistant::extract_directory),
        )
        .route(
            "/api/generate-filename",
            post(routes::assistant::generate_filename),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.api_log.clone(),
            middleware::api_log::api_log_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(api)
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(middleware::api_log::MAX_LOGGED_BODY))
}
