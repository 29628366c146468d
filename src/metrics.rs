// src/metrics.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::path::Path;

/// One-time metric descriptions (so series carry HELP text in the exposition).
pub fn describe_once() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_articles_fetched_total",
            "Articles scraped with non-empty text."
        );
        describe_counter!(
            "digest_articles_failed_total",
            "Article fetches that failed or yielded no content."
        );
        describe_counter!(
            "digest_feed_errors_total",
            "Feeds skipped on network, status, parse or selector errors."
        );
        describe_counter!("digest_sink_deliveries_total", "Successful sink deliveries.");
        describe_counter!("digest_sink_failures_total", "Failed sink deliveries.");
        describe_gauge!("digest_last_run_ts", "Unix ts when the pipeline last finished.");
        describe_histogram!(
            "digest_generation_ms",
            "Report generation round-trip in milliseconds."
        );
    });
}

pub fn mark_run_finished() {
    gauge!("digest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
}

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. The recorder is process-global, so repeated
    /// calls hand back the handle of the first install.
    pub fn install() -> Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| {
                PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")
            })?
            .clone();
        describe_once();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Textfile-collector style dump of the current exposition.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .with_context(|| format!("writing metrics textfile {}", path.display()))
    }
}
