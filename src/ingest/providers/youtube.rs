// src/ingest/providers/youtube.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use std::collections::BTreeMap;

use crate::ingest::feed::{parse_atom, parse_rfc3339, AtomEntry, AtomFeed, FeedBody};
use crate::ingest::normalize_text;
use crate::ingest::types::{Item, SourceAdapter};

pub const YOUTUBE: &str = "youtube";

pub fn channel_feed_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/feeds/videos.xml?channel_id={channel_id}")
}

/// Latest uploads of a fixed set of channels, read from their public Atom feeds.
pub struct YouTubeProvider {
    channels: Vec<FeedBody>,
}

impl YouTubeProvider {
    pub fn from_channel_ids(ids: &[String], client: reqwest::Client) -> Self {
        let channels = ids
            .iter()
            .map(|id| FeedBody::from_url(channel_feed_url(id), client.clone()))
            .collect();
        Self { channels }
    }

    /// One fixture document per channel.
    pub fn from_fixtures(docs: &[&str]) -> Self {
        Self {
            channels: docs.iter().map(|d| FeedBody::Fixture(d.to_string())).collect(),
        }
    }
}

/// `yt:video:<id>` → `<id>`, falling back to the `v=` query of the watch URL.
fn video_id(entry: &AtomEntry) -> Option<String> {
    if let Some(id) = entry.id.as_deref().and_then(|s| s.trim().strip_prefix("yt:video:")) {
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    let href = entry.alternate_href()?;
    let (_, query) = href.split_once('?')?;
    query
        .split('&')
        .find_map(|kv| kv.strip_prefix("v="))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn items_from_atom(feed: AtomFeed, since: DateTime<Utc>) -> Vec<Item> {
    let channel_title = feed.title.clone();
    let mut out = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let Some(vid) = video_id(&entry) else {
            continue;
        };
        let Some(published_at) = entry.published.as_deref().and_then(parse_rfc3339) else {
            continue;
        };
        if published_at < since {
            continue;
        }
        let title = normalize_text(entry.title.as_deref().unwrap_or_default());
        if title.is_empty() {
            continue;
        }
        let url = entry
            .alternate_href()
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={vid}"));
        let summary = entry
            .group
            .as_ref()
            .and_then(|g| g.description.as_deref())
            .map(normalize_text)
            .filter(|s| !s.is_empty());

        let mut metadata = BTreeMap::new();
        let channel = entry
            .author
            .as_ref()
            .and_then(|a| a.name.clone())
            .or_else(|| channel_title.clone());
        if let Some(c) = channel {
            metadata.insert("channel".to_string(), json!(c));
        }
        metadata.insert("kind".to_string(), json!("video"));

        out.push(Item {
            source: YOUTUBE.to_string(),
            natural_key: vid,
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
impl SourceAdapter for YouTubeProvider {
    async fn fetch(&self, since: DateTime<Utc>) -> Result<Vec<Item>> {
        let mut out = Vec::new();
        let mut failures = Vec::new();
        for body in &self.channels {
            let parsed = match body.load().await {
                Ok(xml) => parse_atom(&xml),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(feed) => out.extend(items_from_atom(feed, since)),
                Err(e) => {
                    tracing::warn!(error = ?e, provider = YOUTUBE, "channel feed failed");
                    failures.push(format!("{e:#}"));
                }
            }
        }

        // A single broken channel is tolerated; all of them failing is a source failure.
        if !self.channels.is_empty() && failures.len() == self.channels.len() {
            return Err(anyhow!("all {} channel feeds failed: {}", failures.len(), failures.join("; ")));
        }

        counter!("digest_feed_entries_total", "source" => YOUTUBE).increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        YOUTUBE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <title>AI Builders</title>
 <entry>
  <id>yt:video:abc123</id>
  <yt:videoId>abc123</yt:videoId>
  <title>Shipping RAG to production</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=abc123"/>
  <author><name>AI Builders</name></author>
  <published>2025-03-10T08:00:00+00:00</published>
  <media:group><media:description>Step by step walkthrough.</media:description></media:group>
 </entry>
 <entry>
  <id>yt:video:old999</id>
  <title>Old upload</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=old999"/>
  <published>2025-01-01T08:00:00+00:00</published>
 </entry>
</feed>"#;

    #[tokio::test]
    async fn parses_video_ids_and_window() {
        let p = YouTubeProvider::from_fixtures(&[XML]);
        let since = Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap();
        let items = p.fetch(since).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].natural_key, "abc123");
        assert_eq!(items[0].metadata.get("channel"), Some(&json!("AI Builders")));
    }

    #[tokio::test]
    async fn one_bad_channel_is_tolerated_all_bad_is_error() {
        let since = Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap();
        let mixed = YouTubeProvider::from_fixtures(&[XML, "<feed><entry><title>cut"]);
        assert_eq!(mixed.fetch(since).await.unwrap().len(), 1);

        let broken = YouTubeProvider::from_fixtures(&["<feed><entry><title>cut", "<feed><entry>"]);
        assert!(broken.fetch(since).await.is_err());
    }

    #[test]
    fn video_id_falls_back_to_watch_url() {
        let entry = AtomEntry {
            id: None,
            title: None,
            published: None,
            links: vec![crate::ingest::feed::AtomLink {
                rel: Some("alternate".into()),
                href: Some("https://www.youtube.com/watch?v=zzz&t=5".into()),
            }],
            author: None,
            group: None,
        };
        assert_eq!(video_id(&entry).as_deref(), Some("zzz"));
    }
}
