//! HTTP API server for integration with other systems.
//!
//! Exposes the library, search, script, and settings operations as JSON
//! endpoints. The acting user comes from the `user` query parameter or body
//! field, falling back to `general.default_user`.

use crate::app::App;
use crate::cli::{mask_key, Output};
use crate::error::RoteiroError;
use crate::llm::LlmProvider;
use crate::orchestrator::{ProcessOutcome, MAX_UPLOAD_BYTES};
use crate::progress::ProgressReporter;
use crate::script::{GenerationRequest, TranslationOptions, TranslationResult, SUPPORTED_LANGUAGES};
use crate::store::{SettingsStore, UserSettings};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Build the API router over `app`.
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/documents",
            get(list_documents)
                .post(upload_document)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/documents/{id}", axum::routing::delete(delete_document))
        .route("/documents/{id}/chunks", get(get_chunks))
        .route("/documents/{id}/process", post(process_document))
        .route("/documents/process-stale", post(process_stale))
        .route("/search", post(search))
        .route("/scripts", get(list_scripts).post(generate_script))
        .route("/scripts/{id}", get(get_script))
        .route("/scripts/{id}/approve", post(approve_script))
        .route("/scripts/translate", post(translate_scripts))
        .route("/scripts/{id}/translate", post(translate_script))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/languages", get(languages))
        .layer(CorsLayer::permissive())
        .with_state(app)
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, app: App) -> anyhow::Result<()> {
    let router = router(Arc::new(app));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Roteiro API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Library", "GET    /documents");
    Output::kv("Upload", "POST   /documents?title=&file_name=");
    Output::kv("Process", "POST   /documents/:id/process");
    Output::kv("Sweep", "POST   /documents/process-stale");
    Output::kv("Delete", "DELETE /documents/:id");
    Output::kv("Search", "POST   /search");
    Output::kv("Generate", "POST   /scripts");
    Output::kv("Translate", "POST   /scripts/:id/translate");
    Output::kv("Batch", "POST   /scripts/translate");
    Output::kv("Settings", "GET|PUT /settings");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct UserQuery {
    #[serde(default)]
    user: Option<String>,
}

#[derive(Deserialize)]
struct UploadParams {
    title: String,
    file_name: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Deserialize)]
struct GenerateRequest {
    #[serde(flatten)]
    request: GenerationRequest,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Deserialize)]
struct TranslateRequest {
    target_language: String,
    #[serde(default)]
    options: TranslationOptions,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Deserialize)]
struct BatchTranslateRequest {
    script_ids: Vec<Uuid>,
    target_language: String,
    #[serde(default)]
    options: TranslationOptions,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Serialize)]
struct BatchTranslateItem {
    script_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<TranslationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct SettingsUpdate {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    llm_provider: Option<LlmProvider>,
    #[serde(default)]
    llm_model: Option<String>,
    #[serde(default)]
    openai_api_key: Option<String>,
    #[serde(default)]
    claude_api_key: Option<String>,
    #[serde(default)]
    gemini_api_key: Option<String>,
}

#[derive(Serialize)]
struct SettingsResponse {
    user_id: String,
    llm_provider: LlmProvider,
    llm_model: String,
    openai_api_key: String,
    claude_api_key: String,
    gemini_api_key: String,
}

impl From<&UserSettings> for SettingsResponse {
    fn from(settings: &UserSettings) -> Self {
        Self {
            user_id: settings.user_id.clone(),
            llm_provider: settings.llm_provider,
            llm_model: settings.llm_model.clone(),
            openai_api_key: mask_key(settings.openai_api_key.as_deref()),
            claude_api_key: mask_key(settings.claude_api_key.as_deref()),
            gemini_api_key: mask_key(settings.gemini_api_key.as_deref()),
        }
    }
}

#[derive(Serialize)]
struct ProgressEvent {
    label: String,
    percent: u8,
}

#[derive(Serialize)]
struct ProcessResponse {
    #[serde(flatten)]
    outcome: ProcessOutcome,
    progress: Vec<ProgressEvent>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: RoteiroError) -> Response {
    let status = match &e {
        RoteiroError::NotFound(_) => StatusCode::NOT_FOUND,
        RoteiroError::InvalidInput(_)
        | RoteiroError::UnsupportedFormat(_)
        | RoteiroError::MissingCredential(_) => StatusCode::BAD_REQUEST,
        RoteiroError::Provider { .. } | RoteiroError::EmptyResponse(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(RoteiroError::InvalidInput(message.into()))
}

fn parse_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| bad_request(format!("'{}' is not a valid id", id)))
}

fn user_or_default<'a>(app: &'a App, user: &'a Option<String>) -> &'a str {
    user.as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(&app.settings.general.default_user)
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_documents(State(app): State<Arc<App>>) -> Response {
    match app.orchestrator.library().list_documents().await {
        Ok(documents) => Json(documents).into_response(),
        Err(e) => error_response(e),
    }
}

async fn upload_document(
    State(app): State<Arc<App>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Response {
    let user = user_or_default(&app, &params.user);
    match app
        .orchestrator
        .upload_document(
            user,
            &params.title,
            params.author.as_deref(),
            &params.file_name,
            &body,
        )
        .await
    {
        Ok(doc) => (StatusCode::CREATED, Json(doc)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn process_document(State(app): State<Arc<App>>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let reporter = ProgressReporter::new(Arc::new(move |label: &str, percent: u8| {
        if let Ok(mut events) = sink.lock() {
            events.push(ProgressEvent {
                label: label.to_string(),
                percent,
            });
        }
    }));

    let result = app.orchestrator.process_document(id, &reporter).await;
    let progress = events
        .lock()
        .map(|mut events| std::mem::take(&mut *events))
        .unwrap_or_default();

    match result {
        Ok(outcome) => Json(ProcessResponse { outcome, progress }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn process_stale(State(app): State<Arc<App>>) -> Response {
    Json(app.orchestrator.process_stale_documents().await).into_response()
}

async fn delete_document(State(app): State<Arc<App>>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let outcome = app.orchestrator.delete_document(id).await;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome)).into_response()
}

async fn get_chunks(State(app): State<Arc<App>>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let library = app.orchestrator.library();
    match library.get_document(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(RoteiroError::NotFound(format!("Document {}", id))),
        Err(e) => return error_response(e),
    }

    match library.get_chunks(id).await {
        Ok(chunks) => Json(chunks).into_response(),
        Err(e) => error_response(e),
    }
}

async fn search(State(app): State<Arc<App>>, Json(req): Json<SearchRequest>) -> Response {
    if req.query.trim().is_empty() {
        return bad_request("Query must not be empty");
    }
    let user = user_or_default(&app, &req.user);
    let limit = req.limit.unwrap_or(app.settings.search.default_limit);

    Json(serde_json::json!({
        "results": app.context.search(&req.query, user, limit).await
    }))
    .into_response()
}

async fn generate_script(State(app): State<Arc<App>>, Json(req): Json<GenerateRequest>) -> Response {
    let user = user_or_default(&app, &req.user);
    match app.scripts.generate(user, &req.request).await {
        Ok(generated) => (StatusCode::CREATED, Json(generated)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_scripts(State(app): State<Arc<App>>, Query(query): Query<UserQuery>) -> Response {
    let user = user_or_default(&app, &query.user);
    match app.scripts.list(user).await {
        Ok(scripts) => Json(scripts).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_script(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let user = user_or_default(&app, &query.user);
    match app.scripts.get(user, id).await {
        Ok(script) => Json(script).into_response(),
        Err(e) => error_response(e),
    }
}

async fn approve_script(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let user = user_or_default(&app, &query.user);
    match app.scripts.approve(user, id).await {
        Ok(script) => Json(script).into_response(),
        Err(e) => error_response(e),
    }
}

async fn translate_script(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    Json(req): Json<TranslateRequest>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let user = user_or_default(&app, &req.user);
    match app
        .scripts
        .translate(user, id, &req.target_language, &req.options)
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e),
    }
}

async fn translate_scripts(
    State(app): State<Arc<App>>,
    Json(req): Json<BatchTranslateRequest>,
) -> Response {
    if req.script_ids.is_empty() {
        return bad_request("script_ids must not be empty");
    }
    let user = user_or_default(&app, &req.user);
    let items: Vec<BatchTranslateItem> = app
        .scripts
        .translate_many(user, &req.script_ids, &req.target_language, &req.options)
        .await
        .into_iter()
        .map(|(script_id, result)| match result {
            Ok(result) => BatchTranslateItem {
                script_id,
                result: Some(result),
                error: None,
            },
            Err(e) => BatchTranslateItem {
                script_id,
                result: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    Json(items).into_response()
}

async fn load_settings(app: &App, user: &str) -> Result<UserSettings, RoteiroError> {
    Ok(app
        .store
        .get_user_settings(user)
        .await?
        .unwrap_or_else(|| UserSettings::default_for(user)))
}

async fn get_settings(State(app): State<Arc<App>>, Query(query): Query<UserQuery>) -> Response {
    let user = user_or_default(&app, &query.user);
    match load_settings(&app, user).await {
        Ok(settings) => Json(SettingsResponse::from(&settings)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn update_settings(State(app): State<Arc<App>>, Json(update): Json<SettingsUpdate>) -> Response {
    let user = user_or_default(&app, &update.user);
    let mut settings = match load_settings(&app, user).await {
        Ok(settings) => settings,
        Err(e) => return error_response(e),
    };

    if let Some(provider) = update.llm_provider {
        settings.llm_provider = provider;
    }
    if let Some(model) = update.llm_model.as_deref().map(str::trim) {
        if model.is_empty() {
            return bad_request("Model must not be empty");
        }
        settings.llm_model = model.to_string();
    }
    for (provider, key) in [
        (LlmProvider::OpenAI, update.openai_api_key),
        (LlmProvider::Claude, update.claude_api_key),
        (LlmProvider::Gemini, update.gemini_api_key),
    ] {
        if key.is_some() {
            settings.set_api_key(provider, key);
        }
    }

    match app.store.save_user_settings(&settings).await {
        Ok(()) => Json(SettingsResponse::from(&settings)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn languages() -> impl IntoResponse {
    Json(SUPPORTED_LANGUAGES)
}
