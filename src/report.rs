// src/report.rs
//! RunResult: the one JSON document a run produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ingest::types::ItemKey;
use crate::ingest::FetchOutcome;
use crate::params::RunParams;
use crate::ranking::ScoredItem;
use crate::store::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub success: bool,
    pub hours: u32,
    pub top_n: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Items returned per source; failed sources appear with 0.
    pub fetched: BTreeMap<String, usize>,
    pub errors: BTreeMap<String, String>,
    pub already_seen_count: usize,
    pub duplicate_count: usize,
    /// Pool size after dedup.
    pub candidate_count: usize,
    pub selected_count: usize,
    pub written_count: usize,
    #[serde(default)]
    pub conflicts: Vec<ItemKey>,
    #[serde(default)]
    pub error: Option<String>,
    pub selected_items: Vec<ScoredItem>,
}

/// What happened at the persistence step.
#[derive(Debug)]
pub enum Persistence {
    /// Store never touched (no source succeeded).
    NotAttempted,
    Committed(usize),
    Failed(StoreError),
}

impl RunResult {
    pub fn start(run_id: impl Into<String>, params: RunParams, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            success: false,
            hours: params.hours,
            top_n: params.top_n,
            started_at,
            finished_at: started_at,
            fetched: BTreeMap::new(),
            errors: BTreeMap::new(),
            already_seen_count: 0,
            duplicate_count: 0,
            candidate_count: 0,
            selected_count: 0,
            written_count: 0,
            conflicts: Vec::new(),
            error: None,
            selected_items: Vec::new(),
        }
    }

    pub fn record_fetch(&mut self, outcome: &FetchOutcome) {
        self.fetched = outcome.fetched.clone();
        self.errors = outcome.errors.clone();
    }

    pub fn record_dedupe(&mut self, candidates: usize, already_seen: usize, duplicates: usize) {
        self.candidate_count = candidates;
        self.already_seen_count = already_seen;
        self.duplicate_count = duplicates;
    }

    pub fn record_selection(&mut self, selected: Vec<ScoredItem>) {
        self.selected_count = selected.len();
        self.selected_items = selected;
    }

    /// Settle `success`.
    ///
    /// Success needs at least one source ok and a clean commit (zero items
    /// committed counts). On any failure nothing was persisted, so the
    /// selection is cleared to match.
    pub fn finish(mut self, sources_ok: bool, persistence: Persistence) -> Self {
        self.finished_at = Utc::now();

        match persistence {
            Persistence::Committed(n) if sources_ok => {
                self.written_count = n;
                self.success = true;
            }
            Persistence::Committed(_) | Persistence::NotAttempted => {
                self.error = Some(no_source_message(self.fetched.len()));
            }
            Persistence::Failed(e) => {
                self.conflicts = e.conflicts().to_vec();
                self.error = Some(format!("persistence failed: {e}"));
            }
        }

        if !self.success {
            self.written_count = 0;
            self.selected_count = 0;
            self.selected_items.clear();
        }
        self
    }

    pub fn elapsed_ms(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds().max(0) as f64
    }
}

fn no_source_message(attempted: usize) -> String {
    if attempted == 0 {
        "no sources registered".to_string()
    } else {
        format!("all {attempted} sources failed")
    }
}
