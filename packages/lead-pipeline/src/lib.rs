//! Single-flight ad processing pipeline.
//!
//! Scraped ad candidates arrive in batches, are deduplicated by landing-page
//! domain under a per-session safety cap, and are drained one at a time
//! through a two-stage analysis (landing page, then social profile). Pages
//! showing a sign-up affordance become qualified leads.

pub mod analyzer;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod export;
pub mod ingest;
pub mod links;
pub mod orchestrator;
pub mod pipeline;
pub mod publisher;
pub mod requester;
pub mod session;
pub mod storage;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analyzer::{HtmlPageAnalyzer, HttpPageAnalyzer, HttpPageFetcher};
pub use commands::ScanCommand;
pub use config::{ScanConfig, SocialHandleFallback};
pub use domain::normalize_domain;
pub use error::{AnalysisError, ScanError, StoreError};
pub use events::ScanEvent;
pub use ingest::{BatchIngestor, IngestReport};
pub use orchestrator::{BatchReceipt, DrainExit, DrainTask, ScanDeps, ScanOrchestrator};
pub use publisher::BroadcastPublisher;
pub use requester::ChannelRequester;
pub use session::SessionController;
pub use storage::{JsonFileStore, MemoryStore};
pub use traits::{PageAnalyzer, PageFetcher, ProgressPublisher, ScrapeRequester, StateStore};
pub use types::{
    AdCandidate, AnalysisKind, ContextHandle, FinishReason, Lead, PageAnalysis, ScanPhase,
    ScanProgress, ScanState,
};
