// src/notify/discord.rs
use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;

use super::Sink;
use crate::config::{WebhookConfig, WebhookMode};
use crate::report::Report;

/// Discord rejects `content` longer than this.
pub const INLINE_LIMIT: usize = 2000;

#[derive(Clone)]
pub struct WebhookSink {
    webhook: String,
    client: Client,
    mode: WebhookMode,
    caption: String,
}

#[derive(Serialize)]
struct InlinePayload<'a> {
    content: &'a str,
}

impl WebhookSink {
    pub fn from_config(cfg: &WebhookConfig) -> Result<Self> {
        Ok(Self {
            webhook: cfg.url.clone(),
            client: Client::builder().build().context("building webhook client")?,
            mode: cfg.mode,
            caption: cfg.caption.clone(),
        })
    }

    /// `auto` resolves to inline only when the whole report fits in one message.
    pub fn effective_mode(&self, report: &Report) -> WebhookMode {
        match self.mode {
            WebhookMode::Auto if report.text.chars().count() <= INLINE_LIMIT => WebhookMode::Inline,
            WebhookMode::Auto => WebhookMode::Attachment,
            m => m,
        }
    }

    async fn post_inline(&self, report: &Report) -> Result<()> {
        self.client
            .post(&self.webhook)
            .json(&InlinePayload {
                content: &report.text,
            })
            .send()
            .await
            .map_err(|e| anyhow!("Discord webhook request failed: {e}"))?
            .error_for_status()
            .map_err(|e| anyhow!("Discord webhook HTTP error: {e}"))?;
        Ok(())
    }

    async fn post_attachment(&self, report: &Report) -> Result<()> {
        let file_name = attachment_name(report);
        // Dropping the dir removes the file on every path out of this fn.
        let dir = tempfile::tempdir().context("creating attachment temp dir")?;
        let path = dir.path().join(&file_name);
        tokio::fs::write(&path, report.text.as_bytes())
            .await
            .with_context(|| format!("writing attachment {}", path.display()))?;
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("opening attachment {}", path.display()))?;
        let len = file.metadata().await.context("attachment metadata")?.len();

        // Streamed from disk; the known length keeps a Content-Length on the form.
        let part = Part::stream_with_length(file, len)
            .file_name(file_name)
            .mime_str("text/plain")
            .context("attachment mime")?;
        let form = Form::new()
            .text("content", self.caption.clone())
            .part("file", part);

        self.client
            .post(&self.webhook)
            .multipart(form)
            .send()
            .await
            .map_err(|e| anyhow!("Discord webhook request failed: {e}"))?
            .error_for_status()
            .map_err(|e| anyhow!("Discord webhook HTTP error: {e}"))?;
        Ok(())
    }
}

/// `<label>_<YYYY-MM-DD>.txt`
pub fn attachment_name(report: &Report) -> String {
    format!(
        "{}_{}.txt",
        report.source_label,
        report.generated_for_date.format("%Y-%m-%d")
    )
}

#[async_trait::async_trait]
impl Sink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, report: &Report) -> Result<()> {
        match self.effective_mode(report) {
            WebhookMode::Attachment => self.post_attachment(report).await,
            _ => self.post_inline(report).await,
        }
    }
}
