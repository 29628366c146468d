// src/ingest/types.rs

/// One successfully scraped page. Lives only until it is folded into the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub url: String,
    pub text: String,
}

/// What happened to one source during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Network, status or XML failure; source skipped.
    Failed,
    /// Feed parsed but had zero `<item>` elements.
    NoItems,
    /// Items present, none with a usable link.
    NoLinks,
    Read { candidates: usize, fetched: usize },
}
