// src/notify/telegram.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Sink;
use crate::config::TelegramConfig;
use crate::report::Report;

/// Bot API hard limit on message text.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Consecutive slices of at most `max` chars. Never splits a char; concatenation
/// of the slices is exactly `text`.
pub fn chunk_message(text: &str, max: usize) -> Vec<&str> {
    let max = max.max(1);
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    for (idx, _) in text.char_indices() {
        if count == max {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Clone)]
pub struct TelegramSink {
    client: Client,
    send_url: String,
    chat_id: String,
    title: String,
    chunk_size: usize,
    pacing: Duration,
}

impl TelegramSink {
    pub fn from_config(cfg: &TelegramConfig, title: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build().context("building telegram client")?,
            send_url: format!(
                "{}/bot{}/sendMessage",
                cfg.api_base.trim_end_matches('/'),
                cfg.bot_token
            ),
            chat_id: cfg.chat_id.clone(),
            title: title.to_string(),
            chunk_size: cfg.chunk_size.clamp(1, MAX_MESSAGE_CHARS),
            pacing: Duration::from_millis(cfg.pacing_ms),
        })
    }

    /// `"<title> - <YYYY/MM/DD>\n\n<body>"`
    pub fn frame(&self, date: NaiveDate, body: &str) -> String {
        format!("{} - {}\n\n{}", self.title, date.format("%Y/%m/%d"), body)
    }

    /// Sends slices in order, pausing between them. The first failed slice aborts the rest.
    pub async fn send_text(&self, text: &str) -> Result<usize> {
        let slices = chunk_message(text, self.chunk_size);
        let total = slices.len();
        for (i, slice) in slices.into_iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            self.post(slice)
                .await
                .with_context(|| format!("slice {}/{total}", i + 1))?;
        }
        Ok(total)
    }

    async fn post(&self, text: &str) -> Result<()> {
        self.client
            .post(&self.send_url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .context("telegram post")?
            .error_for_status()
            .context("telegram non-2xx")?;
        Ok(())
    }

    /// Best-effort alert for a run that died; only logs if this fails too.
    /// Always one message: text past `chunk_size` chars is cut.
    pub async fn notify_failure(&self, error: &str, date: NaiveDate) {
        let text = self.frame(date, error);
        let single = chunk_message(&text, self.chunk_size)
            .first()
            .copied()
            .unwrap_or_default();
        if let Err(e) = self.post(single).await {
            tracing::error!(error = ?e, "failure notification not delivered");
        }
    }
}

#[async_trait::async_trait]
impl Sink for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn deliver(&self, report: &Report) -> Result<()> {
        let text = self.frame(report.generated_for_date, &report.text);
        let sent = self.send_text(&text).await?;
        tracing::info!(messages = sent, "telegram report sent");
        Ok(())
    }
}
