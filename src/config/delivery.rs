// src/config/delivery.rs
use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::resolve_env;

static TABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid regex"));

/// Sink sections. An absent section disables that sink.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

impl DeliveryConfig {
    pub(crate) fn resolve(&mut self) -> Result<()> {
        if let Some(s) = self.store.as_mut() {
            s.url = resolve_env(&s.url, "STORE_URL")?;
            if !TABLE_NAME.is_match(&s.table) {
                bail!("delivery.store.table is not a valid identifier: {}", s.table);
            }
        }
        if let Some(w) = self.webhook.as_mut() {
            w.url = resolve_env(&w.url, "DISCORD_WEBHOOK_URL")?;
        }
        if let Some(e) = self.email.as_mut() {
            e.password = resolve_env(&e.password, "EMAIL_PASSWORD")?;
            e.recipients = resolve_env(&e.recipients, "TO_EMAILS")?;
            if e.recipient_list().is_empty() {
                bail!("delivery.email.recipients is empty");
            }
        }
        if let Some(t) = self.telegram.as_mut() {
            t.bot_token = resolve_env(&t.bot_token, "TELEGRAM_BOT_TOKEN")?;
            if t.chunk_size == 0 {
                bail!("delivery.telegram.chunk_size must be at least 1");
            }
        }
        Ok(())
    }
}

fn default_table() -> String {
    "reports".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// sqlx connection URL, e.g. `sqlite://reports.db?mode=rwc`. "ENV" reads STORE_URL.
    pub url: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookMode {
    Inline,
    Attachment,
    #[default]
    Auto,
}

fn default_caption() -> String {
    "Daily market digest".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// "ENV" reads DISCORD_WEBHOOK_URL.
    pub url: String,
    #[serde(default)]
    pub mode: WebhookMode,
    /// Short `content` sent next to an attachment.
    #[serde(default = "default_caption")]
    pub caption: String,
}

fn default_smtp_port() -> u16 {
    465
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub sender: String,
    /// "ENV" reads EMAIL_PASSWORD.
    pub password: String,
    /// Comma-separated addresses. "ENV" reads TO_EMAILS.
    pub recipients: String,
}

impl EmailConfig {
    pub fn recipient_list(&self) -> Vec<String> {
        self.recipients
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}
fn default_chunk_size() -> usize {
    4096
}
fn default_pacing_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// "ENV" reads TELEGRAM_BOT_TOKEN.
    pub bot_token: String,
    pub chat_id: String,
    /// Max chars per message.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Pause between consecutive slices.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}
