// src/config/sources.rs
//! Source registry: the ordered list of feeds a profile reads from.

use serde::{Deserialize, Deserializer};
use std::collections::HashSet;

fn default_selector() -> String {
    "p".to_string()
}

/// One named feed endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub endpoint: String,
    /// Accepts `true`/`false` as well as `1`/`0`.
    #[serde(deserialize_with = "flag")]
    pub enabled: bool,
    /// CSS selector for article body text on the linked pages.
    #[serde(default = "default_selector")]
    pub selector: String,
}

/// Registry order is run order: sources are read in the order they are declared.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SourceRegistry(Vec<Source>);

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self(sources)
    }

    pub fn all(&self) -> &[Source] {
        &self.0
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Source> {
        self.0.iter().filter(|s| s.enabled)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names declared more than once (case-insensitive). Reported, not rejected.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for s in &self.0 {
            let key = s.name.trim().to_ascii_lowercase();
            if !seen.insert(key) && !dups.contains(&s.name) {
                dups.push(s.name.clone());
            }
        }
        dups
    }
}

fn flag<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(de)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "enabled must be 0, 1, true or false (got {other})"
        ))),
    }
}
