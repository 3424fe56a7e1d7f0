//! Error types for the scan pipeline.
//!
//! Analyzer failures stop at the pipeline boundary and become "no match".
//! Storage failures propagate: a transition whose save failed is treated as
//! never having happened.

use std::time::Duration;

use thiserror::Error;

/// Failure of the durable state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state record could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Failure to navigate to or extract from a page.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("analysis of {url} timed out after {elapsed:?}")]
    Timeout { url: String, elapsed: Duration },

    #[error("extraction failed for {url}: {reason}")]
    Extraction { url: String, reason: String },
}

/// Errors surfaced by orchestrator and session operations.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("drain task failed: {0}")]
    DrainTask(#[from] tokio::task::JoinError),
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;
