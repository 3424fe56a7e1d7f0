//! Shared harness for scan flow tests.

use std::path::PathBuf;
use std::sync::Arc;

use lead_pipeline::testing::{RecordingPublisher, RecordingRequester, ScriptedAnalyzer};
use lead_pipeline::{
    AdCandidate, ContextHandle, JsonFileStore, ScanConfig, ScanDeps, ScanOrchestrator,
};
use tempfile::TempDir;

pub struct TestHarness {
    pub orchestrator: ScanOrchestrator,
    pub store: Arc<JsonFileStore>,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub publisher: Arc<RecordingPublisher>,
    pub requester: Arc<RecordingRequester>,
    _dir: TempDir,
}

impl TestHarness {
    /// Orchestrator over a JSON file store in a fresh temp dir.
    pub fn new(analyzer: ScriptedAnalyzer, config: ScanConfig) -> Self {
        // Run with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let dir = tempfile::tempdir().expect("temp dir");
        let store = Arc::new(JsonFileStore::new(dir.path().join("scan-state.json")));
        let analyzer = Arc::new(analyzer);
        let publisher = Arc::new(RecordingPublisher::new());
        let requester = Arc::new(RecordingRequester::new());

        let orchestrator = ScanOrchestrator::new(
            ScanDeps {
                store: store.clone(),
                analyzer: analyzer.clone(),
                publisher: publisher.clone(),
                requester: requester.clone(),
            },
            config,
        );

        Self {
            orchestrator,
            store,
            analyzer,
            publisher,
            requester,
            _dir: dir,
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }
}

pub fn ad(url: &str) -> AdCandidate {
    AdCandidate::new(url, format!("Brand {url}"))
}

pub fn ads(urls: &[&str]) -> Vec<AdCandidate> {
    urls.iter().map(|url| ad(url)).collect()
}

pub fn tab(id: &str) -> Option<ContextHandle> {
    Some(ContextHandle::from(id))
}
