// src/ingest/feed.rs
use anyhow::{anyhow, Context, Result};
use metrics::counter;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::time::Duration;

use super::corpus::Corpus;
use super::fetcher::{parse_selector, ArticleFetcher};
use super::types::FeedOutcome;
use crate::config::{FetchConfig, Source};

/// Item links of an RSS document, in feed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub item_count: usize,
    pub links: Vec<String>,
}

/// Every `<item>` in the document counts, wherever it sits (RSS 2.0 `channel`,
/// RSS 1.0 `rdf:RDF` root, interleaved with other elements). The first non-empty
/// `<link>` of an item is its link.
pub fn parse_item_links(xml: &str) -> Result<ParsedFeed> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let mut reader = Reader::from_str(&xml_clean);
    reader.config_mut().trim_text(true);

    let mut item_count = 0usize;
    let mut links = Vec::new();
    // Some(..) while inside an item; holds that item's link once seen.
    let mut current: Option<Option<String>> = None;
    let mut in_link = false;
    let mut text = String::new();

    loop {
        match reader.read_event().context("parsing rss xml")? {
            Event::Start(e) => match e.name().as_ref() {
                b"item" => {
                    item_count += 1;
                    current = Some(None);
                }
                b"link" if current.is_some() => {
                    in_link = true;
                    text.clear();
                }
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"item" => item_count += 1,
            Event::Text(t) if in_link => {
                text.push_str(&t.unescape().context("unescaping item link")?);
            }
            Event::CData(c) if in_link => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(e) => match e.name().as_ref() {
                b"link" if in_link => {
                    in_link = false;
                    let link = text.trim();
                    if let Some(slot) = current.as_mut() {
                        if slot.is_none() && !link.is_empty() {
                            *slot = Some(link.to_string());
                        }
                    }
                }
                b"item" => {
                    if let Some(Some(link)) = current.take() {
                        links.push(link);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ParsedFeed { item_count, links })
}

pub struct FeedReader {
    client: Client,
}

impl FeedReader {
    /// Plain client: timeout only, no custom headers.
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.feed_timeout_secs))
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }

    pub async fn read(
        &self,
        source: &Source,
        fetcher: &ArticleFetcher,
        corpus: &mut Corpus,
    ) -> FeedOutcome {
        let selector = match parse_selector(&source.selector) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, source = %source.name, "source skipped");
                counter!("digest_feed_errors_total").increment(1);
                return FeedOutcome::Failed;
            }
        };

        let feed = match self.load(&source.endpoint).await {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = ?e, source = %source.name, "feed error");
                counter!("digest_feed_errors_total").increment(1);
                return FeedOutcome::Failed;
            }
        };

        if feed.item_count == 0 {
            tracing::warn!(source = %source.name, "no <item> elements in feed");
            return FeedOutcome::NoItems;
        }
        if feed.links.is_empty() {
            tracing::warn!(source = %source.name, items = feed.item_count, "no item links in feed");
            return FeedOutcome::NoLinks;
        }

        tracing::info!(source = %source.name, candidates = feed.links.len(), "reading feed");
        let mut fetched = 0usize;
        for url in &feed.links {
            let Some(article) = fetcher.fetch(url, &selector).await else {
                continue;
            };
            match corpus.append(&article).await {
                Ok(()) => fetched += 1,
                Err(e) => tracing::warn!(error = ?e, url = %url, "corpus append failed"),
            }
        }

        FeedOutcome::Read {
            candidates: feed.links.len(),
            fetched,
        }
    }

    async fn load(&self, endpoint: &str) -> Result<ParsedFeed> {
        let rsp = self.client.get(endpoint).send().await.context("feed get")?;
        let status = rsp.status();
        if !status.is_success() {
            return Err(anyhow!("feed HTTP status {status}"));
        }
        let body = rsp.text().await.context("feed .text()")?;
        parse_item_links(&body)
    }
}

/// Entities common in feeds but undefined in XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
