use async_trait::async_trait;
use std::time::Duration;

use crate::error::{AnalysisError, StoreError};
use crate::events::ScanEvent;
use crate::types::{AnalysisKind, ContextHandle, PageAnalysis, ScanState};

// ============================================================================
// STATE STORE: the one durable record
// ============================================================================

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state; an empty default when nothing was saved yet.
    async fn load(&self) -> Result<ScanState, StoreError>;

    /// Persist the whole record (last write wins).
    async fn save(&self, state: &ScanState) -> Result<(), StoreError>;
}

// ============================================================================
// PAGE ANALYZER: navigate + classify (implementation swappable)
// ============================================================================

/// One analysis job handed to a [`PageAnalyzer`].
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub url: String,
    pub kind: AnalysisKind,
    /// How long to wait for the page to finish loading before extracting anyway
    pub navigation_timeout: Duration,
}

#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<PageAnalysis, AnalysisError>;
}

// ============================================================================
// PAGE FETCHER: network access for the HTML analyzer
// ============================================================================

/// A loaded page: where we ended up after redirects, and its markup.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub html: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, AnalysisError>;
}

// ============================================================================
// OUTBOUND: UI events and backpressure
// ============================================================================

/// Best-effort event sink for the UI. Never blocks and never fails the caller;
/// events may be dropped when nobody is listening.
pub trait ProgressPublisher: Send + Sync {
    fn publish(&self, event: ScanEvent);
}

#[async_trait]
pub trait ScrapeRequester: Send + Sync {
    /// Ask the scraping collaborator in `context` to scroll and re-scrape.
    async fn request_more_input(&self, context: &ContextHandle) -> anyhow::Result<()>;
}
