// src/config/sources.rs
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "daily-digest/0.1";
pub const DEFAULT_OPENAI_FEED_URL: &str = "https://openai.com/news/rss.xml";
pub const DEFAULT_ANTHROPIC_FEED_URL: &str =
    "https://raw.githubusercontent.com/Olshansk/rss-feeds/main/feeds/feed_anthropic_news.xml";

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_true() -> bool {
    true
}

/// Which sources to poll and how.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Per-adapter budget; a slower adapter is reported as failed.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub youtube: YouTubeSection,
    #[serde(default = "FeedSection::openai")]
    pub openai: FeedSection,
    #[serde(default = "FeedSection::anthropic")]
    pub anthropic: FeedSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Channel ids (`UC…`), polled in this order.
    #[serde(default)]
    pub channels: Vec<String>,
}

impl Default for YouTubeSection {
    fn default() -> Self {
        Self {
            enabled: true,
            channels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub url: String,
}

impl FeedSection {
    fn openai() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_OPENAI_FEED_URL.to_string(),
        }
    }

    fn anthropic() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_ANTHROPIC_FEED_URL.to_string(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            youtube: YouTubeSection::default(),
            openai: FeedSection::openai(),
            anthropic: FeedSection::anthropic(),
        }
    }
}

impl SourcesConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// Trim channel ids and drop blanks/duplicates, keeping order.
    pub fn sanitized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.youtube.channels = self
            .youtube
            .channels
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && seen.insert(c.clone()))
            .collect();
        self
    }
}
