//! Daily digest service: boots the Axum HTTP server exposing the run and
//! migrate triggers.

use daily_digest::api::{self, AppState};
use daily_digest::config::AppConfig;
use daily_digest::metrics::Metrics;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    daily_digest::init_tracing();

    let cfg = AppConfig::from_env();
    let pipeline = daily_digest::build_pipeline(&cfg).await?;

    // Best effort: /api/migrate stays available if this fails.
    if let Err(e) = pipeline.store().migrate().await {
        tracing::warn!(error = %e, "startup migration failed");
    }

    let mut state = AppState::new(pipeline);
    match Metrics::init() {
        Ok(m) => state = state.with_metrics(m.handle),
        Err(e) => tracing::warn!(error = %e, "metrics disabled"),
    }

    Ok(api::router(state).into())
}
