// tests/metrics_pipeline.rs
#![cfg(feature = "strict-metrics")]

mod common;

use common::{item, pipeline, StubAdapter};
use daily_digest::metrics::Metrics;
use daily_digest::params::RunParams;

#[tokio::test]
async fn metrics_exposed_after_run() {
    // Install a local recorder for the test
    let m = Metrics::init().expect("recorder");

    let p = pipeline(vec![
        StubAdapter::items("alpha", vec![item("alpha", "a1", "RAG tutorial", 1)]),
        StubAdapter::failing("beta", "down"),
    ])
    .await;
    let r = p.run(RunParams::default()).await;
    assert!(r.success);

    // Scrape metrics text and check series presence by substring
    let out = m.handle.render();
    assert!(out.contains("digest_runs_total"));
    assert!(out.contains("digest_items_fetched_total"));
    assert!(out.contains("digest_source_errors_total"));
    assert!(out.contains("digest_items_selected_total"));
    assert!(out.contains("digest_run_duration_ms"));
}
