// src/ingest/fetcher.rs
use anyhow::{anyhow, Context, Result};
use metrics::counter;
use once_cell::sync::OnceCell;
use rand::Rng;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

use super::types::Article;
use crate::config::FetchConfig;

/// Randomized pause between article requests. `min > max` is swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min_ms: u64,
    max_ms: u64,
}

impl Pacing {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms > max_ms {
            Self { min_ms: max_ms, max_ms: min_ms }
        } else {
            Self { min_ms, max_ms }
        }
    }

    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    pub fn pick(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    pub async fn pause(&self) {
        let d = self.pick();
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}

pub struct ArticleFetcher {
    client: Client,
    pacing: Pacing,
}

impl ArticleFetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building article http client")?;
        Ok(Self {
            client,
            pacing: Pacing::new(cfg.pacing_min_ms, cfg.pacing_max_ms),
        })
    }

    /// Never fails: every problem is logged and yields `None`. Pauses after each attempt.
    pub async fn fetch(&self, url: &str, selector: &Selector) -> Option<Article> {
        let out = self.try_fetch(url, selector).await;
        match &out {
            Ok(Some(_)) => {
                counter!("digest_articles_fetched_total").increment(1);
            }
            Ok(None) => {
                tracing::warn!(url, "no content");
                counter!("digest_articles_failed_total").increment(1);
            }
            Err(e) => {
                tracing::warn!(error = %e, url, "article fetch failed");
                counter!("digest_articles_failed_total").increment(1);
            }
        }
        self.pacing.pause().await;
        out.ok().flatten()
    }

    async fn try_fetch(&self, url: &str, selector: &Selector) -> Result<Option<Article>> {
        let rsp = self.client.get(url).send().await.context("article get")?;
        let status = rsp.status();
        if !status.is_success() {
            return Err(anyhow!("article HTTP status {status}"));
        }
        let body = rsp.text().await.context("article .text()")?;
        let text = extract_text(&body, selector);
        if text.is_empty() {
            return Ok(None);
        }
        tracing::info!(url, chars = text.chars().count(), "article fetched");
        Ok(Some(Article {
            url: url.to_string(),
            text,
        }))
    }
}

pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow!("invalid selector {s:?}: {e}"))
}

/// Text of every element matching `selector`: text nodes trimmed, whitespace collapsed,
/// one line per non-empty element.
pub fn extract_text(html: &str, selector: &Selector) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("valid regex"));

    let doc = Html::parse_document(html);
    let mut lines = Vec::new();
    for el in doc.select(selector) {
        let joined = el
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let line = re_ws.replace_all(&joined, " ").trim().to_string();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}
