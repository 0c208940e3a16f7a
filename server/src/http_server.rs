use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use maira_core::client::GeminiClient;
use maira_core::resolver::ModelResolver;
use maira_memory::MemoryStore;
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::chat;
use crate::config::AppConfig;
use crate::upload;

/// Ceiling on the multipart request body, sized for a batch of PDFs
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    gemini_client: Arc<GeminiClient>,
    resolver: Arc<ModelResolver>,
    memory: Arc<Mutex<MemoryStore>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        gemini_client: GeminiClient,
        resolver: ModelResolver,
        memory: MemoryStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            gemini_client: Arc::new(gemini_client),
            resolver: Arc::new(resolver),
            memory: Arc::new(Mutex::new(memory)),
        }
    }
}

/// Response model for chat requests
#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(rename = "currentFiles")]
    pub current_files: Vec<String>,
}

/// Response model for reset requests
#[derive(Serialize)]
pub struct ResetResponse {
    pub message: String,
}

/// Error body shared by all failing routes
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error type for the HTTP server
#[derive(Debug)]
pub enum ApiError {
    InternalError(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InternalError(e) => {
                error!(error = %e, "Request failed");
                let body = Json(ErrorResponse {
                    error: e.to_string(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

/// Build the application router over the shared state
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_dir = state.config.public_dir();

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(handle_chat))
        .route("/reset", post(handle_reset))
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Starting HTTP server on {}", addr);

    let app = app_router(state);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start HTTP server: {}", e))
}

/// Health check handler
async fn health() -> impl IntoResponse {
    "Maira is running"
}

/// Handler for chat requests: spool uploads, push them through the
/// Files API, then generate a reply over the full document history.
///
/// The store lock is held across the whole mutate-persist-generate
/// section, so concurrent requests cannot interleave their disk writes.
async fn handle_chat(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = upload::spool_request(&mut multipart, &state.config.uploads_dir()).await?;

    let mut store = state.memory.lock().await;

    if !request.files.is_empty() {
        upload::process_uploads(&state.gemini_client, &mut store, &request.files).await?;
    }

    let reply = chat::generate_reply(
        &state.gemini_client,
        &state.resolver,
        store.records(),
        request.message.as_deref(),
    )
    .await?;

    Ok(Json(ChatResponse {
        reply,
        current_files: store.file_names(),
    }))
}

/// Handler for reset requests: clears the store and its backing file
async fn handle_reset(State(state): State<AppState>) -> Result<Json<ResetResponse>, ApiError> {
    let mut store = state.memory.lock().await;
    store
        .reset()
        .await
        .map_err(|e| ApiError::InternalError(e.into()))?;

    Ok(Json(ResetResponse {
        message: "Ingatan permanen telah dibersihkan!".to_string(),
    }))
}
