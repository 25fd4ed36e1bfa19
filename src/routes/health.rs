use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::MetricsReport;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
    uptime: i64,
    chat_configured: bool,
    translation_backends: Vec<&'static str>,
    metrics: MetricsReport,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        uptime: state.uptime_seconds(),
        chat_configured: state.config.openai_api_key.is_some(),
        translation_backends: state.translator.backends().iter().map(|b| b.name()).collect(),
        metrics: state.metrics.report(),
    })
}
