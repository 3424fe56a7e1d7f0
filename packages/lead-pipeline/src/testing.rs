//! Test doubles for the scan pipeline's collaborators.
//!
//! Compiled for unit tests and behind the `testing` feature for the
//! integration tests in `tests/`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{AnalysisError, StoreError};
use crate::events::ScanEvent;
use crate::storage::MemoryStore;
use crate::traits::{AnalysisRequest, PageAnalyzer, ProgressPublisher, ScrapeRequester, StateStore};
use crate::types::{AnalysisKind, ContextHandle, PageAnalysis, ScanState};

#[derive(Debug, Clone)]
enum Script {
    Respond(PageAnalysis),
    Fail,
    Hang,
}

/// Analyzer that answers from a per-URL script and records every call.
///
/// Unscripted landing pages come back unmatched; unscripted profiles come
/// back empty.
#[derive(Debug, Default)]
pub struct ScriptedAnalyzer {
    scripts: HashMap<(AnalysisKind, String), Script>,
    calls: Mutex<Vec<(AnalysisKind, String)>>,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_landing(mut self, url: impl Into<String>, analysis: PageAnalysis) -> Self {
        self.scripts
            .insert((AnalysisKind::Landing, url.into()), Script::Respond(analysis));
        self
    }

    pub fn with_profile(mut self, url: impl Into<String>, analysis: PageAnalysis) -> Self {
        self.scripts
            .insert((AnalysisKind::Profile, url.into()), Script::Respond(analysis));
        self
    }

    /// Both analyses of `url` fail with a navigation error.
    pub fn failing(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.scripts
            .insert((AnalysisKind::Landing, url.clone()), Script::Fail);
        self.scripts.insert((AnalysisKind::Profile, url), Script::Fail);
        self
    }

    /// Both analyses of `url` never complete.
    pub fn hanging(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.scripts
            .insert((AnalysisKind::Landing, url.clone()), Script::Hang);
        self.scripts.insert((AnalysisKind::Profile, url), Script::Hang);
        self
    }

    /// Calls in the order they were made.
    pub fn calls(&self) -> Vec<(AnalysisKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Landing URLs analyzed, in order.
    pub fn landing_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(kind, _)| *kind == AnalysisKind::Landing)
            .map(|(_, url)| url)
            .collect()
    }
}

#[async_trait]
impl PageAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<PageAnalysis, AnalysisError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.kind, request.url.clone()));

        let script = self
            .scripts
            .get(&(request.kind, request.url.clone()))
            .cloned();

        match script {
            Some(Script::Respond(analysis)) => Ok(analysis),
            Some(Script::Fail) => Err(AnalysisError::Navigation {
                url: request.url.clone(),
                reason: "scripted failure".to_string(),
            }),
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(PageAnalysis::default()),
        }
    }
}

/// Publisher that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ScanEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ScanEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<ScanEvent> {
        self.events()
            .into_iter()
            .filter(ScanEvent::is_terminal)
            .collect()
    }
}

impl ProgressPublisher for RecordingPublisher {
    fn publish(&self, event: ScanEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Requester that records each "more input" request.
#[derive(Debug, Default)]
pub struct RecordingRequester {
    requests: Mutex<Vec<ContextHandle>>,
    fail: AtomicBool,
}

impl RecordingRequester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request is recorded and then reported as undeliverable.
    pub fn unreachable() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ContextHandle> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScrapeRequester for RecordingRequester {
    async fn request_more_input(&self, context: &ContextHandle) -> anyhow::Result<()> {
        self.requests.lock().unwrap().push(context.clone());
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("context {} closed", context);
        }
        Ok(())
    }
}

/// Store whose saves can be switched to fail; loads always succeed.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FailingStore {
    /// Every save fails.
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: AtomicBool::new(true),
        }
    }

    /// Seeded with `state`; saves succeed until [`FailingStore::set_failing`].
    pub fn with_state(state: ScanState) -> Self {
        Self {
            inner: MemoryStore::with_state(state),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateStore for FailingStore {
    async fn load(&self) -> Result<ScanState, StoreError> {
        self.inner.load().await
    }

    async fn save(&self, state: &ScanState) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("scripted save failure".to_string()));
        }
        self.inner.save(state).await
    }
}

/// A landing analysis that qualifies, with the given detection method.
pub fn signup_page(method: &str) -> PageAnalysis {
    PageAnalysis {
        matched: true,
        detection_methods: [method.to_string()].into_iter().collect(),
        ..PageAnalysis::default()
    }
}
