// src/ingest/mod.rs
//! Fetch side of the digest: the adapter fan-out, text normalization and
//! deduplication against previously persisted items.

pub mod feed;
pub mod providers;
pub mod types;

use crate::ingest::types::{Item, ItemKey, SourceAdapter};
use crate::metrics::ensure_metrics_described;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Summaries longer than this (in chars) are cut.
pub const MAX_TEXT_CHARS: usize = 1500;

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }

    out
}

/// Result of one fan-out over all adapters.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Items in adapter registration order, each tagged with its adapter's name.
    pub pool: Vec<Item>,
    pub fetched: BTreeMap<String, usize>,
    pub errors: BTreeMap<String, String>,
    pub attempted: usize,
}

impl FetchOutcome {
    pub fn succeeded(&self) -> usize {
        self.attempted.saturating_sub(self.errors.len())
    }

    /// True when no adapter produced a result (also true with zero adapters).
    pub fn all_failed(&self) -> bool {
        self.succeeded() == 0
    }
}

/// Invoke every adapter concurrently with the same cutoff.
///
/// Each adapter runs in its own task under its own timeout. An error, a timeout
/// or a panic is recorded in `errors` for that adapter only; the other tasks are
/// never cancelled. Results are collected in registration order so the pool is
/// deterministic regardless of which adapter finishes first.
pub async fn fetch_all(
    adapters: &[Arc<dyn SourceAdapter>],
    since: DateTime<Utc>,
    per_adapter_timeout: Duration,
) -> FetchOutcome {
    ensure_metrics_described();

    let handles: Vec<_> = adapters
        .iter()
        .map(|a| {
            let adapter = Arc::clone(a);
            let name = adapter.name();
            let handle = tokio::spawn(async move {
                let t0 = Instant::now();
                let res = tokio::time::timeout(per_adapter_timeout, adapter.fetch(since)).await;
                (res, t0.elapsed())
            });
            (name, handle)
        })
        .collect();

    let mut outcome = FetchOutcome {
        attempted: handles.len(),
        ..FetchOutcome::default()
    };

    for (name, handle) in handles {
        let result = match handle.await {
            Ok((Ok(Ok(items)), elapsed)) => {
                histogram!("digest_source_fetch_ms", "source" => name)
                    .record(elapsed.as_secs_f64() * 1_000.0);
                Ok(items)
            }
            Ok((Ok(Err(e)), _)) => Err(format!("{e:#}")),
            Ok((Err(_), _)) => Err(format!("timed out after {:?}", per_adapter_timeout)),
            Err(join_err) => Err(format!("fetch task aborted: {join_err}")),
        };

        match result {
            Ok(items) => {
                tracing::info!(source = name, items = items.len(), "source fetched");
                counter!("digest_items_fetched_total", "source" => name)
                    .increment(items.len() as u64);
                *outcome.fetched.entry(name.to_string()).or_insert(0) += items.len();
                outcome.pool.extend(items.into_iter().map(|mut it| {
                    it.source = name.to_string();
                    it
                }));
            }
            Err(msg) => {
                tracing::warn!(source = name, error = %msg, "source failed");
                counter!("digest_source_errors_total", "source" => name).increment(1);
                outcome.fetched.entry(name.to_string()).or_insert(0);
                outcome.errors.insert(name.to_string(), msg);
            }
        }
    }

    outcome
}

/// Drop items already persisted, then in-run repeats (first occurrence wins).
/// Returns (kept, already_seen_count, duplicate_count).
pub fn dedupe(pool: Vec<Item>, persisted: &HashSet<ItemKey>) -> (Vec<Item>, usize, usize) {
    let mut already_seen = 0usize;
    let fresh: Vec<Item> = pool
        .into_iter()
        .filter(|it| {
            let seen = persisted.contains(&it.key());
            if seen {
                already_seen += 1;
            }
            !seen
        })
        .collect();

    let mut seen_keys: HashSet<ItemKey> = HashSet::with_capacity(fresh.len());
    let mut keep = Vec::with_capacity(fresh.len());
    let mut duplicates = 0usize;
    for it in fresh {
        if !seen_keys.insert(it.key()) {
            duplicates += 1;
            continue;
        }
        keep.push(it);
    }

    (keep, already_seen, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(source: &str, key: &str) -> Item {
        Item {
            source: source.into(),
            natural_key: key.into(),
            title: format!("{source} {key}"),
            published_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            url: format!("https://example.test/{key}"),
            summary: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b>!</p>  &ldquo;ok&rdquo; ";
        assert_eq!(normalize_text(s), r#"Hello, world ! "ok""#);
    }

    #[test]
    fn normalize_text_caps_length() {
        let long = "a".repeat(MAX_TEXT_CHARS + 50);
        assert_eq!(normalize_text(&long).chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn dedupe_drops_persisted_then_repeats() {
        let persisted: HashSet<ItemKey> = [ItemKey::new("openai", "a")].into_iter().collect();
        let pool = vec![
            item("openai", "a"),
            item("openai", "b"),
            item("youtube", "b"),
            item("openai", "b"),
        ];
        let (kept, seen, dup) = dedupe(pool, &persisted);
        let keys: Vec<String> = kept.iter().map(|i| i.key().to_string()).collect();
        assert_eq!(keys, vec!["openai:b", "youtube:b"]);
        assert_eq!(seen, 1);
        assert_eq!(dup, 1);
    }

    #[test]
    fn same_key_in_different_sources_is_not_a_duplicate() {
        let (kept, _, dup) = dedupe(vec![item("a", "x"), item("b", "x")], &HashSet::new());
        assert_eq!(kept.len(), 2);
        assert_eq!(dup, 0);
    }
}
