// src/notify/store.rs
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Connection, SqliteConnection};

use super::Sink;
use crate::config::StoreConfig;
use crate::report::Report;

/// Archives each report as one row. Connection is opened and closed per delivery.
pub struct StoreSink {
    url: String,
    table: String,
}

impl StoreSink {
    /// `table` was validated as a plain identifier when the config was loaded.
    pub fn new(cfg: &StoreConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            table: cfg.table.clone(),
        }
    }

    async fn write(&self, conn: &mut SqliteConnection, report: &Report) -> Result<()> {
        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                date TEXT NOT NULL,
                report TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            self.table
        );
        sqlx::query(&create)
            .execute(&mut *conn)
            .await
            .context("failed to create reports table")?;

        let insert = format!(
            "INSERT INTO {} (source, date, report, created_at) VALUES (?, ?, ?, ?)",
            self.table
        );
        sqlx::query(&insert)
            .bind(&report.source_label)
            .bind(report.date_label())
            .bind(&report.text)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await
            .context("failed to insert report")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink for StoreSink {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn deliver(&self, report: &Report) -> Result<()> {
        let mut conn = SqliteConnection::connect(&self.url)
            .await
            .context("store connect")?;
        let res = self.write(&mut conn, report).await;
        if let Err(e) = conn.close().await {
            tracing::warn!(error = ?e, "store close failed");
        }
        res?;
        tracing::info!(table = %self.table, date = %report.date_label(), "report stored");
        Ok(())
    }
}
