// src/ingest/providers/articles.rs
//! Blog/news providers backed by an RSS 2.0 feed (OpenAI news, Anthropic news).

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use std::collections::BTreeMap;

use crate::ingest::feed::{parse_rfc2822, parse_rss, FeedBody, Rss};
use crate::ingest::normalize_text;
use crate::ingest::types::{Item, SourceAdapter};

pub const OPENAI: &str = "openai";
pub const ANTHROPIC: &str = "anthropic";

pub struct ArticleFeedProvider {
    name: &'static str,
    body: FeedBody,
}

impl ArticleFeedProvider {
    pub fn new(name: &'static str, body: FeedBody) -> Self {
        Self { name, body }
    }

    pub fn openai(body: FeedBody) -> Self {
        Self::new(OPENAI, body)
    }

    pub fn anthropic(body: FeedBody) -> Self {
        Self::new(ANTHROPIC, body)
    }

    pub fn from_fixture(name: &'static str, xml: &str) -> Self {
        Self::new(name, FeedBody::Fixture(xml.to_string()))
    }
}

/// Convert parsed RSS into items published at or after `since`.
/// Entries without a link or a parseable date are skipped.
pub fn items_from_rss(source: &str, rss: Rss, since: DateTime<Utc>) -> Vec<Item> {
    let mut out = Vec::with_capacity(rss.channel.items.len());
    for it in rss.channel.items {
        let title = normalize_text(it.title.as_deref().unwrap_or_default());
        let guid = it.guid.and_then(|g| g.value).map(|g| g.trim().to_string());
        let url = it
            .link
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .or_else(|| guid.clone().filter(|g| g.starts_with("http")));
        if title.is_empty() {
            continue;
        }
        let Some(url) = url else {
            continue;
        };
        let Some(published_at) = it.pub_date.as_deref().and_then(parse_rfc2822) else {
            tracing::debug!(source, url = %url, "skipping entry without valid pubDate");
            continue;
        };
        if published_at < since {
            continue;
        }

        let summary = it
            .description
            .as_deref()
            .map(normalize_text)
            .filter(|s| !s.is_empty());

        let mut metadata = BTreeMap::new();
        if !it.categories.is_empty() {
            metadata.insert("categories".to_string(), json!(it.categories));
        }
        if let Some(g) = guid.filter(|g| !g.is_empty()) {
            metadata.insert("guid".to_string(), json!(g));
        }

        out.push(Item {
            source: source.to_string(),
            natural_key: url.clone(),
            title,
            published_at,
            url,
            summary,
            metadata,
        });
    }
    out
}

#[async_trait]
impl SourceAdapter for ArticleFeedProvider {
    async fn fetch(&self, since: DateTime<Utc>) -> Result<Vec<Item>> {
        let xml = self.body.load().await?;
        let rss = parse_rss(&xml)?;
        let items = items_from_rss(self.name, rss, since);
        counter!("digest_feed_entries_total", "source" => self.name).increment(items.len() as u64);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
