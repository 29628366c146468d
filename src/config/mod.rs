// src/config/mod.rs
pub mod delivery;
pub mod llm;
pub mod sources;

pub use delivery::{
    DeliveryConfig, EmailConfig, StoreConfig, TelegramConfig, WebhookConfig, WebhookMode,
};
pub use llm::LlmConfig;
pub use sources::{Source, SourceRegistry};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

/// Complete configuration of one profile. Built once, passed explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub sources: SourceRegistry,
}

fn default_title() -> String {
    "Daily Market Digest".to_string()
}
fn default_source_label() -> String {
    "RSS_Feed_Analysis".to_string()
}
fn default_corpus_path() -> PathBuf {
    PathBuf::from("allnews.txt")
}
fn default_log_path() -> PathBuf {
    PathBuf::from("bot.log")
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Used in email subjects and bot message headers.
    #[serde(default = "default_title")]
    pub title: String,
    /// Stored as the record's `source`, also names webhook attachments.
    #[serde(default = "default_source_label")]
    pub source_label: String,
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Abort the run (with the failure alert) when no article was collected.
    /// Off by default: the model is asked anyway, with an empty corpus.
    #[serde(default)]
    pub require_articles: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            source_label: default_source_label(),
            corpus_path: default_corpus_path(),
            log_path: default_log_path(),
            require_articles: false,
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_pacing_min_ms() -> u64 {
    1000
}
fn default_pacing_max_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Article page timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub feed_timeout_secs: u64,
    /// Randomized pause after every article attempt, inclusive range.
    #[serde(default = "default_pacing_min_ms")]
    pub pacing_min_ms: u64,
    #[serde(default = "default_pacing_max_ms")]
    pub pacing_max_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            feed_timeout_secs: default_timeout_secs(),
            pacing_min_ms: default_pacing_min_ms(),
            pacing_max_ms: default_pacing_max_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus exposition is written here at the end of a run.
    #[serde(default)]
    pub textfile: Option<PathBuf>,
}

impl DigestConfig {
    /// Parse TOML text, resolve "ENV" secrets and validate.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: DigestConfig = toml::from_str(s).context("parsing digest config")?;
        cfg.finish()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading digest config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Load using env var + fallback:
    /// 1) $DIGEST_CONFIG_PATH
    /// 2) config/digest.toml
    pub fn load_default() -> Result<Self> {
        Self::load_from(&default_path()?)
    }

    fn finish(&mut self) -> Result<()> {
        if self.fetch.pacing_min_ms > self.fetch.pacing_max_ms {
            // swap to keep a valid interval
            std::mem::swap(&mut self.fetch.pacing_min_ms, &mut self.fetch.pacing_max_ms);
        }
        self.llm.resolve()?;
        self.delivery.resolve()?;
        Ok(())
    }

    /// Non-fatal problems, for the caller to log once a subscriber is installed.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        let dups = self.sources.duplicate_names();
        if !dups.is_empty() {
            out.push(format!("duplicate source names in registry: {}", dups.join(", ")));
        }
        if self.sources.enabled().next().is_none() {
            out.push("no enabled sources".to_string());
        }
        out
    }
}

/// Which file [`DigestConfig::load_default`] would read.
pub fn default_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// `"ENV"` (any case) means: read the value from `var`.
pub fn resolve_env(value: &str, var: &str) -> Result<String> {
    if value.trim().eq_ignore_ascii_case("env") {
        std::env::var(var).map_err(|_| anyhow!("Missing {var} env var"))
    } else {
        Ok(value.to_string())
    }
}
