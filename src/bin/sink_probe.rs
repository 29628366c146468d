//! Sends a short probe report through every sink configured in the profile,
//! without scraping or calling the model. Useful after changing credentials.

use chrono::Local;
use market_digest::config::{self, DigestConfig};
use market_digest::{Fanout, Report};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let path: std::path::PathBuf = match std::env::args().nth(1) {
        Some(p) => p.into(),
        None => config::default_path()?,
    };
    let cfg = DigestConfig::load_from(&path)?;
    let fanout = Fanout::from_config(&cfg.delivery, &cfg.run)?;

    let report = Report {
        text: "Sink probe: delivery channels are wired correctly.".into(),
        generated_for_date: Local::now().date_naive(),
        source_label: cfg.run.source_label.clone(),
    };

    let mut failed = 0;
    for r in fanout.deliver(&report).await {
        match r.error {
            None => println!("{:<10} ok", r.sink_name),
            Some(e) => {
                failed += 1;
                println!("{:<10} FAILED: {e}", r.sink_name);
            }
        }
    }
    if fanout.is_empty() {
        println!("no sinks configured in {}", path.display());
    }

    println!("sink-probe done");
    if failed > 0 {
        anyhow::bail!("{failed} sink(s) failed");
    }
    Ok(())
}
