// src/api.rs
use std::collections::HashMap;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::params::RunParams;
use crate::pipeline::Pipeline;
use crate::report::RunResult;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Present when the process installed a Prometheus recorder.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/run", get(run))
        .route("/api/migrate", get(migrate))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `GET /api/run?hours=&top_n=`: 200 when the run succeeded, 500 otherwise.
/// The body is always the RunResult.
async fn run(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<RunResult>) {
    let params = RunParams::from_query(&q);
    let result = state.pipeline.run(params).await;
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(result))
}

async fn migrate(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.pipeline.store().migrate().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "message": "schema is up to date" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "migration endpoint failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}

async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.metrics {
        Some(h) => (StatusCode::OK, h.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed\n".to_string()),
    }
}
