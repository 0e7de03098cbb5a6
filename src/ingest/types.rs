// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity of an item: `(source, natural_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub source: String,
    pub natural_key: String,
}

impl ItemKey {
    pub fn new(source: impl Into<String>, natural_key: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            natural_key: natural_key.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.natural_key)
    }
}

/// A normalized content record produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub source: String,      // e.g., "youtube", "openai"
    pub natural_key: String, // article URL or video id
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// Source-specific attributes (channel name, tags, categories).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Item {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.source.clone(), self.natural_key.clone())
    }

    /// Flattened string values of `metadata` (arrays are expanded, other types skipped).
    pub fn metadata_text(&self) -> String {
        let mut parts = Vec::new();
        for v in self.metadata.values() {
            match v {
                serde_json::Value::String(s) => parts.push(s.as_str()),
                serde_json::Value::Array(arr) => {
                    parts.extend(arr.iter().filter_map(|x| x.as_str()));
                }
                _ => {}
            }
        }
        parts.join(" ")
    }
}

/// One content source. `fetch` returns the items published at or after `since`;
/// an empty vector is a valid result, not an error.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, since: DateTime<Utc>) -> Result<Vec<Item>>;
    fn name(&self) -> &'static str;
}
