// tests/common/mod.rs
//! Shared builders for integration tests: stub adapters, items, an in-memory pipeline.
#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

use daily_digest::config::profile::{Profile, AVOID_MARKETING_HYPE, PREFER_PRACTICAL};
use daily_digest::ingest::types::{Item, SourceAdapter};
use daily_digest::pipeline::Pipeline;
use daily_digest::ranking::{Ranker, RankingConfig};
use daily_digest::store::Store;

pub enum Behavior {
    Items(Vec<Item>),
    Fail(&'static str),
    Sleep(Duration),
    Panic,
}

pub struct StubAdapter {
    pub name: &'static str,
    pub behavior: Behavior,
}

impl StubAdapter {
    pub fn items(name: &'static str, items: Vec<Item>) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            name,
            behavior: Behavior::Items(items),
        })
    }

    pub fn failing(name: &'static str, msg: &'static str) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            name,
            behavior: Behavior::Fail(msg),
        })
    }

    pub fn slow(name: &'static str, d: Duration) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            name,
            behavior: Behavior::Sleep(d),
        })
    }

    pub fn panicking(name: &'static str) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            name,
            behavior: Behavior::Panic,
        })
    }
}

#[async_trait]
impl SourceAdapter for StubAdapter {
    async fn fetch(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<Item>> {
        match &self.behavior {
            Behavior::Items(items) => Ok(items
                .iter()
                .filter(|i| i.published_at >= since)
                .cloned()
                .collect()),
            Behavior::Fail(msg) => Err(anyhow!("{msg}")),
            Behavior::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok(Vec::new())
            }
            Behavior::Panic => panic!("adapter exploded"),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// An item `minutes_ago` old. `source` is overwritten by the orchestrator anyway.
pub fn item(source: &str, key: &str, title: &str, minutes_ago: i64) -> Item {
    Item {
        source: source.to_string(),
        natural_key: key.to_string(),
        title: title.to_string(),
        published_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
        url: format!("https://example.test/{source}/{key}"),
        summary: None,
        metadata: Default::default(),
    }
}

pub fn profile() -> Profile {
    Profile {
        name: "tester".into(),
        title: "AI Engineer".into(),
        background: String::new(),
        interests: vec![
            "Retrieval-Augmented Generation (RAG) systems".into(),
            "AI agent architectures and orchestration frameworks".into(),
        ],
        preferences: [(PREFER_PRACTICAL.to_string(), true), (AVOID_MARKETING_HYPE.to_string(), true)]
            .into_iter()
            .collect(),
        expertise_level: "Junior".into(),
    }
}

pub fn ranker() -> Ranker {
    Ranker::new(&profile(), &RankingConfig::default_seed()).expect("ranker")
}

pub async fn migrated_store() -> Store {
    let store = Store::connect("sqlite::memory:").await.expect("connect");
    store.migrate().await.expect("migrate");
    store
}

pub async fn pipeline(adapters: Vec<Arc<dyn SourceAdapter>>) -> Pipeline {
    Pipeline::new(adapters, ranker(), migrated_store().await)
}
