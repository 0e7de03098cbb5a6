// src/ingest/providers/mod.rs
pub mod articles;
pub mod youtube;

use anyhow::Result;
use std::sync::Arc;

use crate::config::sources::SourcesConfig;
use crate::ingest::feed::{http_client, FeedBody};
use crate::ingest::types::SourceAdapter;
use articles::ArticleFeedProvider;
use youtube::YouTubeProvider;

/// The fixed, live adapter list in invocation order: YouTube, OpenAI, Anthropic.
/// Disabled sources (and YouTube without channels) are left out.
pub fn build_from_config(cfg: &SourcesConfig) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let client = http_client(&cfg.user_agent, cfg.fetch_timeout())?;
    let mut out: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    if cfg.youtube.enabled && !cfg.youtube.channels.is_empty() {
        out.push(Arc::new(YouTubeProvider::from_channel_ids(
            &cfg.youtube.channels,
            client.clone(),
        )));
    }
    if cfg.openai.enabled {
        out.push(Arc::new(ArticleFeedProvider::openai(FeedBody::from_url(
            cfg.openai.url.clone(),
            client.clone(),
        ))));
    }
    if cfg.anthropic.enabled {
        out.push(Arc::new(ArticleFeedProvider::anthropic(FeedBody::from_url(
            cfg.anthropic.url.clone(),
            client,
        ))));
    }

    let names: Vec<&str> = out.iter().map(|a| a.name()).collect();
    tracing::info!(sources = ?names, "source adapters registered");
    Ok(out)
}
