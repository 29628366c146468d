// src/notify/email.rs
use anyhow::{anyhow, Context, Result};
use lettre::message::{Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Sink;
use crate::config::EmailConfig;
use crate::report::Report;

/// SMTP delivery. Generic over the transport so tests can swap in a stub.
/// Addresses are parsed per message, so a bad one fails only this sink.
pub struct EmailSink<T = AsyncSmtpTransport<Tokio1Executor>> {
    mailer: T,
    from: String,
    to: Vec<String>,
    title: String,
}

impl EmailSink {
    /// Implicit TLS (`relay`), authenticated with sender + password.
    pub fn from_config(cfg: &EmailConfig, title: &str) -> Result<Self> {
        let creds = Credentials::new(cfg.sender.clone(), cfg.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .with_context(|| format!("invalid smtp_host {}", cfg.smtp_host))?
            .port(cfg.smtp_port)
            .credentials(creds)
            .build();
        Self::with_transport(mailer, cfg, title)
    }
}

impl<T> EmailSink<T> {
    pub fn with_transport(mailer: T, cfg: &EmailConfig, title: &str) -> Result<Self> {
        Ok(Self {
            mailer,
            from: cfg.sender.clone(),
            to: cfg.recipient_list(),
            title: title.to_string(),
        })
    }

    pub fn transport(&self) -> &T {
        &self.mailer
    }

    pub fn build_message(&self, report: &Report) -> Result<Message> {
        let from: Mailbox = self
            .from
            .parse()
            .with_context(|| format!("invalid sender address {}", self.from))?;
        let mut builder = Message::builder()
            .from(from)
            .subject(format!("{} - {}", self.title, report.date_label()));
        for r in &self.to {
            let mb: Mailbox = r.parse().map_err(|e| anyhow!("invalid recipient {r}: {e}"))?;
            builder = builder.to(mb);
        }
        builder
            .multipart(MultiPart::mixed().singlepart(SinglePart::plain(report.text.clone())))
            .context("build email")
    }
}

#[async_trait::async_trait]
impl<T> Sink for EmailSink<T>
where
    T: AsyncTransport + Send + Sync,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, report: &Report) -> Result<()> {
        let msg = self.build_message(report)?;
        self.mailer.send(msg).await.context("send email")?;
        tracing::info!(recipients = self.to.len(), "email sent");
        Ok(())
    }
}
