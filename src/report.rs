// src/report.rs
//! Report generation: one chat-completions call over the whole run corpus.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use metrics::histogram;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::LlmConfig;

/// How much of an error response body is kept in the returned error. The full body is logged.
const ERROR_BODY_CHARS: usize = 300;

pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
Date: {date}

Below is the full text of today's collected financial news articles:
{corpus}

------
Select the {top_n} most important news items. For each item give a short analysis:
- Background
- Impact and consequences
- Investment implication
- Potentially affected stocks, with tickers
- Importance rating from 1 to 5 stars
- Source of the news
";

/// `{corpus}` is substituted last so article text can never inject placeholders.
pub fn render_prompt(template: &str, date: NaiveDate, top_n: u32, corpus: &str) -> String {
    template
        .replace("{date}", &date.format("%Y/%m/%d").to_string())
        .replace("{top_n}", &top_n.to_string())
        .replace("{corpus}", corpus)
}

/// The generated digest. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    pub generated_for_date: NaiveDate,
    pub source_label: String,
}

impl Report {
    /// `YYYY/MM/DD`, as stored in records.
    pub fn date_label(&self) -> String {
        self.generated_for_date.format("%Y/%m/%d").to_string()
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}
#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

pub struct ReportGenerator {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_n: u32,
    template: String,
    source_label: String,
}

impl ReportGenerator {
    pub fn from_config(cfg: &LlmConfig, source_label: &str) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("building llm http client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            top_n: cfg.top_n,
            template: cfg
                .prompt_template
                .clone()
                .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()),
            source_label: source_label.to_string(),
        })
    }

    pub async fn generate(&self, corpus: &str, date: NaiveDate) -> Result<Report> {
        let prompt = render_prompt(&self.template, date, self.top_n, corpus);
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::info!(model = %self.model, prompt_chars = prompt.chars().count(), "requesting report");
        let t0 = Instant::now();
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("llm post")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "report generation failed");
            let excerpt: String = body.chars().take(ERROR_BODY_CHARS).collect();
            bail!("LLM API error {status}: {excerpt}");
        }

        let body: Resp = resp.json().await.context("decoding llm response")?;
        histogram!("digest_generation_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("LLM response has no choices"))?;

        tracing::info!(chars = text.chars().count(), "report generated");
        Ok(Report {
            text,
            generated_for_date: date,
            source_label: self.source_label.clone(),
        })
    }
}
