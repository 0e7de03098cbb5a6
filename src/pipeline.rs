// src/pipeline.rs
//! One digest run: fetch -> dedupe -> rank -> select -> commit -> report.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::sources::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::ingest::types::SourceAdapter;
use crate::ingest::{dedupe, fetch_all};
use crate::metrics::ensure_metrics_described;
use crate::params::RunParams;
use crate::ranking::Ranker;
use crate::report::{Persistence, RunResult};
use crate::select::select;
use crate::store::Store;

pub struct Pipeline {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    ranker: Ranker,
    store: Store,
    fetch_timeout: Duration,
}

impl Pipeline {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, ranker: Ranker, store: Store) -> Self {
        Self {
            adapters,
            ranker,
            store,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Execute one run. Never panics and never returns an error: every
    /// failure is folded into the returned `RunResult`.
    #[tracing::instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, params: RunParams) -> RunResult {
        ensure_metrics_described();
        let t0 = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let started_at = Utc::now();
        let since = started_at
            .checked_sub_signed(params.window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut result = RunResult::start(run_id.clone(), params, started_at);

        let outcome = fetch_all(&self.adapters, since, self.fetch_timeout).await;
        result.record_fetch(&outcome);
        let sources_ok = !outcome.all_failed();

        let result = if !sources_ok {
            tracing::warn!(
                attempted = outcome.attempted,
                "no source succeeded, skipping store"
            );
            result.finish(false, Persistence::NotAttempted)
        } else {
            let persistence = self.select_and_commit(&mut result, outcome.pool, params, &run_id).await;
            let result = result.finish(true, persistence);
            if let Err(e) = self.store.record_run(&result).await {
                tracing::warn!(error = %e, "run audit row not written");
            }
            result
        };

        let outcome_label = if result.success { "success" } else { "failure" };
        counter!("digest_runs_total", "outcome" => outcome_label).increment(1);
        counter!("digest_items_selected_total").increment(result.selected_count as u64);
        counter!("digest_items_written_total").increment(result.written_count as u64);
        histogram!("digest_run_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        gauge!("digest_last_run_ts").set(result.finished_at.timestamp() as f64);

        tracing::info!(
            success = result.success,
            fetched = result.fetched.values().sum::<usize>(),
            candidates = result.candidate_count,
            selected = result.selected_count,
            written = result.written_count,
            errors = result.errors.len(),
            elapsed_ms = result.elapsed_ms(),
            "run finished"
        );
        result
    }

    async fn select_and_commit(
        &self,
        result: &mut RunResult,
        pool: Vec<crate::ingest::types::Item>,
        params: RunParams,
        run_id: &str,
    ) -> Persistence {
        let persisted = match self.store.existing_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(error = %e, "reading persisted keys failed");
                return Persistence::Failed(e);
            }
        };

        let (candidates, already_seen, duplicates) = dedupe(pool, &persisted);
        result.record_dedupe(candidates.len(), already_seen, duplicates);
        tracing::debug!(
            candidates = candidates.len(),
            already_seen,
            duplicates,
            "pool deduplicated"
        );

        let selected = select(self.ranker.rank(candidates), params.top_n);
        result.record_selection(selected);
        if result.selected_items.is_empty() {
            return Persistence::Committed(0);
        }

        match self.store.insert_all(&result.selected_items, run_id).await {
            Ok(n) => Persistence::Committed(n),
            Err(e) => {
                tracing::error!(error = %e, "commit failed");
                Persistence::Failed(e)
            }
        }
    }
}
