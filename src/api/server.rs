//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::{handlers, models::ApiResponse};
use crate::audio::AudioIngestor;
use crate::config::Config;
use crate::error::TranscriptionError;
use crate::transcription::SubtitleGenerator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub generator: SubtitleGenerator,
    pub ingestor: AudioIngestor,
    pub config: Arc<Config>,
}

/// Build the router for the given state
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = state.config.audio.max_upload_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        .route("/api/subtitles", post(subtitles_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(config: Arc<Config>) -> Result<()> {
    let state = AppState {
        generator: SubtitleGenerator::from_config(&config.service)?,
        ingestor: AudioIngestor::from_config(&config.audio),
        config: config.clone(),
    };

    let app = router(state);

    let addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🌐 API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = handlers::health_check(state.generator.service().model());
    (StatusCode::OK, Json(ApiResponse::success(health)))
}

/// Subtitle generation handler
async fn subtitles_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match handlers::read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return failure_response(e),
    };

    match handlers::create_subtitles(&state.generator, &state.ingestor, upload).await {
        Ok(result) => {
            let headers = [
                (
                    header::CONTENT_TYPE,
                    "application/x-subrip; charset=utf-8".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", result.filename),
                ),
                (
                    header::HeaderName::from_static("x-audio-duration-seconds"),
                    format!("{:.3}", result.duration.as_secs_f64()),
                ),
                (
                    header::HeaderName::from_static("x-long-file"),
                    result.long_file.to_string(),
                ),
            ];
            (StatusCode::OK, headers, result.document.into_string()).into_response()
        }
        Err(e) => failure_response(e),
    }
}

fn failure_response(err: TranscriptionError) -> Response {
    let status = handlers::status_for(err.kind());
    warn!("Request failed with {} [{}]: {}", status, err.kind(), err.message());
    (status, Json(ApiResponse::<()>::failure(&err))).into_response()
}
