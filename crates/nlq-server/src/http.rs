//! HTTP API
//!
//! - `POST /api/query`: answer a question
//! - `GET /api/schema`: catalog with live row counts
//! - `GET /api/examples`: supported example questions
//! - `GET /health`, `GET /metrics`

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::engine::{AnswerResponse, Engine};

#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
}

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/api/query", post(ask))
        .route("/api/schema", get(schema))
        .route("/api/examples", get(examples))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(AppState { engine })
}

pub async fn serve(addr: &str, engine: Arc<Engine>) -> anyhow::Result<()> {
    let mode = engine.mode();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, mode = mode.as_str(), "nlq HTTP server listening");

    axum::serve(listener, router(engine)).await?;
    Ok(())
}

async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AnswerResponse>, (StatusCode, Json<AnswerResponse>)> {
    match state.engine.answer(&req.question).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => Err((
            e.error.status_code(),
            Json(state.engine.failure(&req.question, &e)),
        )),
    }
}

async fn schema(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.schema().await)
}

async fn examples() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "examples": nlq_intent::example_questions() }))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.metrics().render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            error!(error = %e, "Metrics encoding failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                String::new(),
            )
        }
    }
}
