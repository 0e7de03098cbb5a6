// src/metrics.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_runs_total", "Pipeline runs by outcome.");
        describe_counter!(
            "digest_source_errors_total",
            "Adapter failures (error, timeout or panic) by source."
        );
        describe_counter!(
            "digest_items_fetched_total",
            "Items returned by adapters, by source."
        );
        describe_counter!(
            "digest_feed_entries_total",
            "Feed entries kept inside the lookback window, by source."
        );
        describe_counter!("digest_items_selected_total", "Items selected for the digest.");
        describe_counter!("digest_items_written_total", "Items committed to the store.");
        describe_histogram!("digest_run_duration_ms", "End-to-end run time in milliseconds.");
        describe_histogram!(
            "digest_source_fetch_ms",
            "Successful adapter fetch time in milliseconds."
        );
        describe_histogram!("digest_feed_parse_ms", "Feed XML parse time in milliseconds.");
        describe_gauge!("digest_last_run_ts", "Unix ts when a run last finished.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }
}
