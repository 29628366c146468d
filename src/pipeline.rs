// src/pipeline.rs
//! One run: reset corpus, read sources, generate the report, fan it out.

use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::config::{DigestConfig, SourceRegistry};
use crate::ingest::{self, ArticleFetcher, Corpus, FeedOutcome, FeedReader};
use crate::notify::{DeliveryResult, Fanout, TelegramSink};
use crate::report::{Report, ReportGenerator};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub sources: Vec<(String, FeedOutcome)>,
    pub articles: usize,
    pub deliveries: Vec<DeliveryResult>,
}

impl RunSummary {
    pub fn failed_sinks(&self) -> impl Iterator<Item = &DeliveryResult> {
        self.deliveries.iter().filter(|d| !d.success)
    }
}

pub struct Pipeline {
    registry: SourceRegistry,
    fetcher: ArticleFetcher,
    feeds: FeedReader,
    corpus: Corpus,
    generator: ReportGenerator,
    fanout: Fanout,
    alert: Option<TelegramSink>,
    require_articles: bool,
}

impl Pipeline {
    pub fn from_config(cfg: &DigestConfig) -> Result<Self> {
        let alert = match &cfg.delivery.telegram {
            Some(t) => Some(TelegramSink::from_config(t, &cfg.run.title)?),
            None => None,
        };
        Ok(Self {
            registry: cfg.sources.clone(),
            fetcher: ArticleFetcher::new(&cfg.fetch)?,
            feeds: FeedReader::new(&cfg.fetch)?,
            corpus: Corpus::with_artifact(&cfg.run.corpus_path),
            generator: ReportGenerator::from_config(&cfg.llm, &cfg.run.source_label)?,
            fanout: Fanout::from_config(&cfg.delivery, &cfg.run)?,
            alert,
            require_articles: cfg.run.require_articles,
        })
    }

    /// Replace the configured sinks (the failure alert channel is kept).
    pub fn with_fanout(mut self, fanout: Fanout) -> Self {
        self.fanout = fanout;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Full run. A fatal error triggers a best-effort bot alert before it is returned.
    pub async fn run(&mut self, date: NaiveDate) -> Result<RunSummary> {
        tracing::info!(%date, sources = self.registry.len(), sinks = self.fanout.len(), "run started");
        let res = self.run_inner(date).await;
        crate::metrics::mark_run_finished();
        match res {
            Ok(summary) => {
                let failed = summary.failed_sinks().count();
                tracing::info!(
                    articles = summary.articles,
                    deliveries = summary.deliveries.len(),
                    failed,
                    "run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(error = ?e, "run aborted");
                if let Some(alert) = &self.alert {
                    alert.notify_failure(&format!("Run failed: {e:#}"), date).await;
                }
                Err(e)
            }
        }
    }

    /// Ingest and generate only; nothing is delivered.
    pub async fn dry_run(&mut self, date: NaiveDate) -> Result<Report> {
        let (_, report) = self.ingest_and_generate(date).await?;
        Ok(report)
    }

    async fn run_inner(&mut self, date: NaiveDate) -> Result<RunSummary> {
        let (sources, report) = self.ingest_and_generate(date).await?;
        let deliveries = self.fanout.deliver(&report).await;
        Ok(RunSummary {
            date,
            sources,
            articles: self.corpus.len(),
            deliveries,
        })
    }

    async fn ingest_and_generate(
        &mut self,
        date: NaiveDate,
    ) -> Result<(Vec<(String, FeedOutcome)>, Report)> {
        self.corpus.reset().await?;
        let sources =
            ingest::collect(&self.registry, &self.feeds, &self.fetcher, &mut self.corpus).await;

        if self.corpus.is_empty() {
            if self.require_articles {
                bail!("no articles collected from {} enabled source(s)", sources.len());
            }
            tracing::warn!(sources = sources.len(), "no articles collected, generating over an empty corpus");
        } else {
            tracing::info!(articles = self.corpus.len(), "corpus ready");
        }

        let report = self.generator.generate(&self.corpus.snapshot(), date).await?;
        Ok((sources, report))
    }
}
