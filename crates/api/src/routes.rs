use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use pepe_core::domain::report::{DigestResponse, Report};
use pepe_core::llm::prompt::PromptStyle;
use pepe_core::pipeline::Pipeline;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

const GENERIC_FAILURE: &str = "Failed to fetch and summarize PEPE news.";

#[derive(Clone)]
pub struct AppState {
    /// Holds the setup error when startup could not build the clients (e.g. no API key).
    pub pipeline: Result<Pipeline, String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/pepe", get(get_pepe))
        .route("/api/pepe-news", get(get_pepe_news))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_pepe(State(state): State<AppState>) -> Result<Json<Report>, ApiError> {
    let report = run_pipeline(&state, PromptStyle::Advice).await?;
    Ok(Json(report))
}

async fn get_pepe_news(State(state): State<AppState>) -> Result<Json<DigestResponse>, ApiError> {
    let report = run_pipeline(&state, PromptStyle::Digest).await?;
    Ok(Json(report.into()))
}

async fn run_pipeline(state: &AppState, style: PromptStyle) -> Result<Report, ApiError> {
    let pipeline = match &state.pipeline {
        Ok(pipeline) => pipeline,
        Err(setup_error) => {
            tracing::error!(error = %setup_error, "pipeline unavailable");
            return Err(internal_error(setup_error.clone()));
        }
    };

    let request_id = Uuid::new_v4();
    pipeline
        .run(style)
        .instrument(tracing::info_span!("pipeline", %request_id, ?style))
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(%request_id, error = %e, "pipeline failed");
            internal_error(e.to_string())
        })
}

fn internal_error(message: String) -> ApiError {
    let error = if message.is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error }),
    )
}
