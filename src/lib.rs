// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod params;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod select;
pub mod store;

pub use crate::api::router;
pub use crate::pipeline::Pipeline;
pub use crate::report::RunResult;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::profile::Profile;
use crate::config::sources::SourcesConfig;
use crate::config::{load_toml_or, AppConfig, ENV_SOURCES_CONFIG_PATH};
use crate::ranking::{Ranker, RankingConfig};
use crate::store::Store;

pub const DEFAULT_LOG_FILTER: &str = "daily_digest=info,warn";

/// Compact tracing to stderr, filtered by `RUST_LOG`. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Load profile, weights and sources, open the store and wire the live pipeline.
/// The schema is not touched here; callers decide when to migrate.
pub async fn build_pipeline(cfg: &AppConfig) -> Result<Pipeline> {
    let profile = Profile::load(&cfg.profile_path)?;
    let weights = RankingConfig::load(&cfg.ranking_path)?;
    let sources: SourcesConfig =
        load_toml_or(&cfg.sources_path, ENV_SOURCES_CONFIG_PATH, SourcesConfig::default)?;
    let sources = sources.sanitized();

    let ranker = Ranker::new(&profile, &weights)?;
    let adapters = ingest::providers::build_from_config(&sources)?;
    let store = Store::connect(&cfg.database_url)
        .await
        .with_context(|| format!("opening store at {}", cfg.database_url))?;

    tracing::info!(
        profile = %profile.name,
        interests = profile.interests.len(),
        sources = adapters.len(),
        "pipeline ready"
    );
    Ok(Pipeline::new(adapters, ranker, store).with_fetch_timeout(sources.fetch_timeout()))
}
