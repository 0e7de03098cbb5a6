// src/ingest/feed.rs
//! RSS 2.0 and Atom document shapes shared by the feed-based providers, plus
//! the fetch helper that either reads a fixture or performs an HTTP GET.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

/* ----------------------------
RSS 2.0
---------------------------- */

#[derive(Debug, Deserialize)]
pub struct Rss {
    pub channel: Channel,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    #[serde(default, rename = "item")]
    pub items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    pub description: Option<String>,
    pub guid: Option<Guid>,
    #[serde(default, rename = "category")]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Guid {
    #[serde(rename = "$text")]
    pub value: Option<String>,
}

/* ----------------------------
Atom (YouTube channel feeds)
---------------------------- */

#[derive(Debug, Deserialize)]
pub struct AtomFeed {
    pub title: Option<String>,
    #[serde(default, rename = "entry")]
    pub entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AtomEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub published: Option<String>,
    #[serde(default, rename = "link")]
    pub links: Vec<AtomLink>,
    pub author: Option<AtomAuthor>,
    #[serde(alias = "media:group")]
    pub group: Option<MediaGroup>,
}

#[derive(Debug, Deserialize)]
pub struct AtomLink {
    #[serde(rename = "@rel")]
    pub rel: Option<String>,
    #[serde(rename = "@href")]
    pub href: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtomAuthor {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaGroup {
    #[serde(alias = "media:description")]
    pub description: Option<String>,
}

impl AtomEntry {
    /// The `alternate` link, or the first link with an href.
    pub fn alternate_href(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref().unwrap_or("alternate") == "alternate" && l.href.is_some())
            .or_else(|| self.links.iter().find(|l| l.href.is_some()))
            .and_then(|l| l.href.as_deref())
    }
}

pub fn parse_rss(xml: &str) -> Result<Rss> {
    let t0 = std::time::Instant::now();
    let rss: Rss = from_str(&scrub_html_entities_for_xml(xml)).context("parsing rss xml")?;
    histogram!("digest_feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(rss)
}

pub fn parse_atom(xml: &str) -> Result<AtomFeed> {
    let t0 = std::time::Instant::now();
    let feed: AtomFeed =
        from_str(&scrub_html_entities_for_xml(xml)).context("parsing atom xml")?;
    histogram!("digest_feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(feed)
}

/// RSS `pubDate` (RFC 2822) → UTC. Named zones (`GMT`, `EST`) go through chrono.
pub fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    match OffsetDateTime::parse(ts, &Rfc2822) {
        Ok(odt) => DateTime::from_timestamp(odt.unix_timestamp(), 0),
        Err(_) => DateTime::parse_from_rfc2822(ts)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Atom `published` (RFC 3339) → UTC.
pub fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Where a provider reads its XML from.
pub enum FeedBody {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl FeedBody {
    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        FeedBody::Http {
            url: url.into(),
            client,
        }
    }

    pub async fn load(&self) -> Result<String> {
        match self {
            FeedBody::Fixture(s) => Ok(s.clone()),
            FeedBody::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?
                    .error_for_status()
                    .with_context(|| format!("GET {url}"))?;
                resp.text().await.with_context(|| format!("reading body of {url}"))
            }
        }
    }
}

/// Build the shared HTTP client used by live providers.
pub fn http_client(user_agent: &str, timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .context("building http client")
}

/// quick-xml only knows the five XML entities; feeds routinely use HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
