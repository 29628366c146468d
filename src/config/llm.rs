// src/config/llm.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::resolve_env;

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    30_000
}
fn default_top_n() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Full URL of an OpenAI-compatible chat-completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// "ENV" means: read from OPENAI_API_KEY
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// How many ranked items the digest should contain.
    #[serde(default = "default_top_n")]
    pub top_n: u32,
    /// Overrides the built-in analytical template. Placeholders: `{date}`, `{top_n}`, `{corpus}`.
    #[serde(default)]
    pub prompt_template: Option<String>,
    /// Request timeout; `None` keeps the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl LlmConfig {
    pub(crate) fn resolve(&mut self) -> Result<()> {
        self.api_key = resolve_env(&self.api_key, "OPENAI_API_KEY")?;

        // Sanitize sampling temperature
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        if self.top_n == 0 {
            self.top_n = default_top_n();
        }

        if let Some(t) = &self.prompt_template {
            if !t.contains("{corpus}") {
                anyhow::bail!("llm.prompt_template must contain the {{corpus}} placeholder");
            }
        }
        Ok(())
    }
}
