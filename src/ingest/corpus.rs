// src/ingest/corpus.rs
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use super::types::Article;

/// Ordered run corpus, optionally mirrored write-through to a text artifact.
#[derive(Debug, Default)]
pub struct Corpus {
    path: Option<PathBuf>,
    text: String,
    count: usize,
}

impl Corpus {
    pub fn with_artifact(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Clears memory and truncates the artifact. Safe to call repeatedly.
    pub async fn reset(&mut self) -> Result<()> {
        self.text.clear();
        self.count = 0;
        if let Some(p) = &self.path {
            tokio::fs::File::create(p)
                .await
                .with_context(|| format!("truncating corpus {}", p.display()))?;
        }
        Ok(())
    }

    /// Artifact first, so memory never holds an entry the file lacks.
    pub async fn append(&mut self, article: &Article) -> Result<()> {
        let entry = format_entry(article);
        if let Some(p) = &self.path {
            let mut f = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .await
                .with_context(|| format!("opening corpus {}", p.display()))?;
            f.write_all(entry.as_bytes())
                .await
                .with_context(|| format!("appending to corpus {}", p.display()))?;
            f.flush().await.context("flushing corpus")?;
        }
        self.text.push_str(&entry);
        self.count += 1;
        Ok(())
    }

    pub fn snapshot(&self) -> String {
        self.text.clone()
    }

    /// Number of articles appended since the last reset.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

pub fn format_entry(a: &Article) -> String {
    format!("URL: {}\nContent: {}\n\n", a.url, a.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn art(url: &str, text: &str) -> Article {
        Article {
            url: url.into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn in_memory_keeps_arrival_order() {
        let mut c = Corpus::in_memory();
        c.append(&art("https://a.test/1", "one")).await.unwrap();
        c.append(&art("https://a.test/2", "two")).await.unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(
            c.snapshot(),
            "URL: https://a.test/1\nContent: one\n\nURL: https://a.test/2\nContent: two\n\n"
        );
        c.reset().await.unwrap();
        assert!(c.is_empty());
        assert_eq!(c.snapshot(), "");
    }
}
