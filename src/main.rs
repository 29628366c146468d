//! market-digest: one scheduled run of the news digest pipeline.
//! Reads the profile config, scrapes feeds, generates the report and delivers it.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use market_digest::config::{self, DigestConfig};
use market_digest::metrics::Metrics;
use market_digest::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "market-digest", about = "Scrape financial RSS feeds, generate a digest, deliver it")]
struct Args {
    /// Profile config (TOML). Falls back to $DIGEST_CONFIG_PATH, then config/digest.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run date (YYYY-MM-DD); defaults to today in local time
    #[arg(long, value_name = "DATE")]
    date: Option<NaiveDate>,

    /// Generate the report and print it, skip every sink
    #[arg(long)]
    dry_run: bool,

    /// Log level when RUST_LOG is unset (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Console + run log artifact. The artifact is truncated on every start.
fn init_tracing(log_level: &str, log_path: &std::path::Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file = File::create(log_path)
        .with_context(|| format!("creating log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load .env in local/dev; secrets marked "ENV" in the profile resolve from it.
    let _ = dotenvy::dotenv();

    let path = match &args.config {
        Some(p) => p.clone(),
        None => config::default_path()?,
    };
    let cfg = DigestConfig::load_from(&path)?;

    init_tracing(&args.log_level, &cfg.run.log_path)?;
    tracing::info!(config = %path.display(), sources = cfg.sources.len(), "config loaded");
    for w in cfg.warnings() {
        tracing::warn!("{w}");
    }

    let metrics = match &cfg.metrics.textfile {
        Some(_) => Some(Metrics::install()?),
        None => None,
    };

    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let mut pipeline = Pipeline::from_config(&cfg)?;

    let result = if args.dry_run {
        pipeline.dry_run(date).await.map(|report| {
            println!("{}", report.text);
        })
    } else {
        pipeline.run(date).await.map(|summary| {
            for d in summary.failed_sinks() {
                tracing::warn!(sink = %d.sink_name, error = ?d.error, "sink failed this run");
            }
        })
    };

    if let (Some(m), Some(p)) = (&metrics, &cfg.metrics.textfile) {
        if let Err(e) = m.write_textfile(p) {
            tracing::warn!(error = ?e, "metrics textfile not written");
        }
    }

    result
}
