// src/ingest/mod.rs
pub mod corpus;
pub mod feed;
pub mod fetcher;
pub mod types;

pub use corpus::Corpus;
pub use feed::FeedReader;
pub use fetcher::{ArticleFetcher, Pacing};
pub use types::{Article, FeedOutcome};

use crate::config::SourceRegistry;

/// Read every enabled source in registry order. Disabled sources are never contacted.
pub async fn collect(
    registry: &SourceRegistry,
    feeds: &FeedReader,
    fetcher: &ArticleFetcher,
    corpus: &mut Corpus,
) -> Vec<(String, FeedOutcome)> {
    crate::metrics::describe_once();

    for s in registry.all().iter().filter(|s| !s.enabled) {
        tracing::debug!(source = %s.name, "source disabled");
    }

    let mut outcomes = Vec::new();
    for source in registry.enabled() {
        let outcome = feeds.read(source, fetcher, corpus).await;
        tracing::info!(source = %source.name, ?outcome, "source done");
        outcomes.push((source.name.clone(), outcome));
    }
    outcomes
}
