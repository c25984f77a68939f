use crate::generation::{self, GenerationError, TextGenerator};
use crate::summary::{self, SummaryLength};
use axum::{
    extract::{Json as JsonPayload, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

pub const MODEL: &str = "gemma-3n-e2b-it";

const ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .with_state(Arc::new(state))
}

/// Browser access is limited to the local frontend dev server; any method
/// or header those origins ask for is allowed.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(ALLOWED_ORIGINS.map(HeaderValue::from_static))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

// -------------------------------------------------------------------
// Summaries

async fn generate(
    State(state): State<Arc<AppState>>,
    JsonPayload(payload): JsonPayload<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let length = SummaryLength::from_hint(payload.length.as_deref());
    tracing::info!(
        length = length.as_str(),
        chars = payload.text.chars().count(),
        "generating summary"
    );

    let prompt = summary::build_prompt(&payload.text, length.target());
    let stream = state
        .generator
        .generate_stream(MODEL, &prompt)
        .await
        .map_err(ApiError::upstream)?;
    let result = generation::collect_fragments(stream)
        .await
        .map_err(ApiError::upstream)?;

    tracing::debug!(chars = result.chars().count(), "summary complete");
    Ok(Json(GenerateResponse { result }))
}

// -------------------------------------------------------------------
// DTOs & errors

#[derive(Deserialize)]
struct GenerateRequest {
    text: String,
    length: Option<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
    result: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }
    fn upstream(e: GenerationError) -> Self {
        tracing::error!(error = %e, "upstream generation failed");
        Self::new(StatusCode::BAD_GATEWAY, "upstream_error", "summary generation failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorBody { code: self.code, message: self.message });
        (self.status, body).into_response()
    }
}
