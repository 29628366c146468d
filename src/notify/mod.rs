// src/notify/mod.rs
pub mod discord;
pub mod email;
pub mod store;
pub mod telegram;

pub use discord::WebhookSink;
pub use email::EmailSink;
pub use store::StoreSink;
pub use telegram::TelegramSink;

use anyhow::Result;
use metrics::counter;

use crate::config::{DeliveryConfig, RunConfig};
use crate::report::Report;

/// One delivery destination for a finished report.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, report: &Report) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub sink_name: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Sequential fan-out: a failing sink never stops the ones after it.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn Sink>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn with(mut self, sink: impl Sink + 'static) -> Self {
        self.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Store, webhook, email, bot: in that order, each only if configured.
    pub fn from_config(delivery: &DeliveryConfig, run: &RunConfig) -> Result<Self> {
        let mut out = Self::new();
        if let Some(c) = &delivery.store {
            out.push(Box::new(StoreSink::new(c)));
        } else {
            tracing::debug!("store sink disabled (no [delivery.store])");
        }
        if let Some(c) = &delivery.webhook {
            out.push(Box::new(WebhookSink::from_config(c)?));
        } else {
            tracing::debug!("webhook sink disabled (no [delivery.webhook])");
        }
        if let Some(c) = &delivery.email {
            out.push(Box::new(EmailSink::from_config(c, &run.title)?));
        } else {
            tracing::debug!("email sink disabled (no [delivery.email])");
        }
        if let Some(c) = &delivery.telegram {
            out.push(Box::new(TelegramSink::from_config(c, &run.title)?));
        } else {
            tracing::debug!("telegram sink disabled (no [delivery.telegram])");
        }
        Ok(out)
    }

    pub async fn deliver(&self, report: &Report) -> Vec<DeliveryResult> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let res = match sink.deliver(report).await {
                Ok(()) => {
                    tracing::info!(sink = sink.name(), "report delivered");
                    counter!("digest_sink_deliveries_total", "sink" => sink.name()).increment(1);
                    DeliveryResult {
                        sink_name: sink.name().to_string(),
                        success: true,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, sink = sink.name(), "delivery failed");
                    counter!("digest_sink_failures_total", "sink" => sink.name()).increment(1);
                    DeliveryResult {
                        sink_name: sink.name().to_string(),
                        success: false,
                        error: Some(format!("{e:#}")),
                    }
                }
            };
            results.push(res);
        }
        results
    }
}
