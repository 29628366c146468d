// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod report;

pub use crate::config::DigestConfig;
pub use crate::notify::{DeliveryResult, Fanout, Sink};
pub use crate::pipeline::{Pipeline, RunSummary};
pub use crate::report::Report;
