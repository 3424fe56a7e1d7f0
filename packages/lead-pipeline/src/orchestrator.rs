//! The scan state machine: `Idle → Draining → AwaitingMoreInput ⇄ Draining → Finished`.
//!
//! Every transition is a load-mutate-save round trip on the [`StateStore`]
//! performed while holding one async mutex. The mutex is never held across
//! page analysis or the inter-step delay, so batches and resets interleave
//! freely with a running drain. The mutex also records which session owns
//! the running drain, which makes "at most one drain per session" a hard
//! guarantee instead of a best-effort flag check.
//!
//! Queue items are processed strictly one at a time in FIFO order.

use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

use crate::commands::ScanCommand;
use crate::config::ScanConfig;
use crate::error::Result;
use crate::events::ScanEvent;
use crate::ingest::{BatchIngestor, IngestReport};
use crate::pipeline::AnalysisPipeline;
use crate::session::SessionController;
use crate::traits::{PageAnalyzer, ProgressPublisher, ScrapeRequester, StateStore};
use crate::types::{AdCandidate, ContextHandle, FinishReason, Lead, ScanPhase, ScanState};

/// Collaborators the orchestrator drives.
#[derive(Clone)]
pub struct ScanDeps {
    pub store: Arc<dyn StateStore>,
    pub analyzer: Arc<dyn PageAnalyzer>,
    pub publisher: Arc<dyn ProgressPublisher>,
    pub requester: Arc<dyn ScrapeRequester>,
}

/// What the drain loop does next, decided from the persisted state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStep {
    /// Pop the queue head and analyze it
    Process,
    /// Queue empty, cap not reached: ask the scraper for more
    AwaitInput,
    Finish(FinishReason),
}

/// Decide the next drain step.
///
/// The success target, when configured, is consulted first and ends the
/// session as soon as enough leads are in, even with items still queued.
/// The safety cap only ends the session once the queue is empty.
pub fn next_step(state: &ScanState, config: &ScanConfig) -> DrainStep {
    if let Some(target) = config.success_target {
        if state.qualified_leads.len() >= target {
            return DrainStep::Finish(FinishReason::TargetReached);
        }
    }

    if !state.processing_queue.is_empty() {
        DrainStep::Process
    } else if state.scanned_domains.len() >= config.safety_cap {
        DrainStep::Finish(FinishReason::SafetyCapReached)
    } else {
        DrainStep::AwaitInput
    }
}

/// How a drain loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainExit {
    /// Queue exhausted below the cap; waiting for the next batch
    AwaitingInput,
    Finished(FinishReason),
    /// The session was reset or stopped underneath the loop
    Abandoned,
}

/// Handle to a spawned drain loop.
#[derive(Debug)]
pub struct DrainTask {
    session_id: Uuid,
    handle: JoinHandle<Result<DrainExit>>,
}

impl DrainTask {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Wait for the loop to stop.
    pub async fn wait(self) -> Result<DrainExit> {
        self.handle.await?
    }
}

/// Resolves when the loop stops. `&mut DrainTask` can sit in a `select!` branch.
impl Future for DrainTask {
    type Output = Result<DrainExit>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(joined) => Poll::Ready(joined?),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Outcome of accepting one batch.
#[derive(Debug)]
pub struct BatchReceipt {
    pub report: IngestReport,
    /// Set when this batch started a new drain loop
    pub drain: Option<DrainTask>,
}

/// Session that currently owns the drain loop, if any.
#[derive(Debug, Default)]
struct DrainGate {
    owner: Option<Uuid>,
}

impl DrainGate {
    fn release(&mut self, session_id: Uuid) {
        if self.owner == Some(session_id) {
            self.owner = None;
        }
    }
}

struct Inner {
    deps: ScanDeps,
    config: ScanConfig,
    sessions: SessionController,
    ingestor: BatchIngestor,
    gate: Mutex<DrainGate>,
}

#[derive(Clone)]
pub struct ScanOrchestrator {
    inner: Arc<Inner>,
}

impl ScanOrchestrator {
    pub fn new(deps: ScanDeps, config: ScanConfig) -> Self {
        let sessions =
            SessionController::new(deps.store.clone(), deps.publisher.clone(), config.safety_cap);
        let ingestor = BatchIngestor::new(config.safety_cap);

        Self {
            inner: Arc::new(Inner {
                deps,
                config,
                sessions,
                ingestor,
                gate: Mutex::new(DrainGate::default()),
            }),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.inner.config
    }

    /// Dispatch one inbound command. Drain loops started here run detached.
    pub async fn handle(&self, command: ScanCommand) -> Result<()> {
        match command {
            ScanCommand::StartScanSession { context } => {
                self.start_session(context).await?;
            }
            ScanCommand::ProcessBatch {
                candidates,
                context,
            } => {
                self.process_batch(candidates, context).await?;
            }
            ScanCommand::StopScan => {
                self.stop().await?;
            }
        }
        Ok(())
    }

    /// Reset to an empty session. A drain still running for the previous
    /// session stops at its next step; its pending result is discarded.
    pub async fn start_session(&self, context: Option<ContextHandle>) -> Result<ScanState> {
        let mut gate = self.inner.gate.lock().await;
        let state = self.inner.sessions.start_session(context).await?;
        gate.owner = None;
        Ok(state)
    }

    /// Ingest a batch and start a drain loop unless one already runs for
    /// this session. Batches arriving after the session finished are ignored.
    pub async fn process_batch(
        &self,
        candidates: Vec<AdCandidate>,
        context: Option<ContextHandle>,
    ) -> Result<BatchReceipt> {
        let inner = &self.inner;
        let mut gate = inner.gate.lock().await;
        let mut state = inner.deps.store.load().await?;

        if state.is_finished() {
            tracing::info!(
                session_id = %state.session_id,
                received = candidates.len(),
                "Session finished, ignoring batch"
            );
            return Ok(BatchReceipt {
                report: IngestReport {
                    received: candidates.len(),
                    queue_len: state.processing_queue.len(),
                    ..IngestReport::default()
                },
                drain: None,
            });
        }

        if let Some(context) = context {
            state.session_target = Some(context);
        }

        let report = inner.ingestor.ingest(candidates, &mut state);
        let start_drain = gate.owner != Some(state.session_id);
        if start_drain {
            state.phase = ScanPhase::Draining;
        }
        inner.deps.store.save(&state).await?;

        tracing::info!(
            session_id = %state.session_id,
            received = report.received,
            admitted = report.admitted,
            queued = report.queue_len,
            scanned = state.scanned_domains.len(),
            "Batch ingested"
        );
        inner
            .deps
            .publisher
            .publish(ScanEvent::Progress(state.progress(inner.config.safety_cap)));

        let drain = start_drain.then(|| self.spawn_drain(&mut gate, state.session_id));
        Ok(BatchReceipt { report, drain })
    }

    /// End the session now with reason "Stopped". No-op once finished.
    pub async fn stop(&self) -> Result<ScanState> {
        let mut gate = self.inner.gate.lock().await;
        let mut state = self.inner.deps.store.load().await?;
        if state.is_finished() {
            return Ok(state);
        }

        self.inner
            .sessions
            .finalize(&mut state, FinishReason::Stopped)
            .await?;
        gate.release(state.session_id);
        Ok(state)
    }

    /// Restart the drain for a persisted session that was mid-drain when
    /// the process went away.
    pub async fn resume(&self) -> Result<Option<DrainTask>> {
        let mut gate = self.inner.gate.lock().await;
        let state = self.inner.deps.store.load().await?;

        if state.phase != ScanPhase::Draining || gate.owner == Some(state.session_id) {
            return Ok(None);
        }

        tracing::info!(
            session_id = %state.session_id,
            queued = state.processing_queue.len(),
            "Resuming interrupted drain"
        );
        Ok(Some(self.spawn_drain(&mut gate, state.session_id)))
    }

    pub async fn snapshot(&self) -> Result<ScanState> {
        Ok(self.inner.deps.store.load().await?)
    }

    fn spawn_drain(&self, gate: &mut MutexGuard<'_, DrainGate>, session_id: Uuid) -> DrainTask {
        gate.owner = Some(session_id);
        let inner = self.inner.clone();

        let handle = tokio::spawn(async move {
            let result = inner.drain(session_id).await;
            if let Err(e) = &result {
                tracing::error!(session_id = %session_id, error = %e, "Drain loop failed");
                inner.gate.lock().await.release(session_id);
            }
            result
        });

        DrainTask { session_id, handle }
    }
}

impl Inner {
    async fn drain(&self, session_id: Uuid) -> Result<DrainExit> {
        tracing::debug!(session_id = %session_id, "Drain loop started");

        loop {
            let candidate = {
                let mut gate = self.gate.lock().await;
                if gate.owner != Some(session_id) {
                    return Ok(DrainExit::Abandoned);
                }

                let mut state = self.deps.store.load().await?;
                if state.session_id != session_id || state.is_finished() {
                    gate.release(session_id);
                    return Ok(DrainExit::Abandoned);
                }

                match next_step(&state, &self.config) {
                    DrainStep::Finish(reason) => {
                        self.sessions.finalize(&mut state, reason).await?;
                        gate.release(session_id);
                        return Ok(DrainExit::Finished(reason));
                    }
                    DrainStep::AwaitInput => {
                        state.phase = ScanPhase::AwaitingMoreInput;
                        self.deps.store.save(&state).await?;
                        gate.release(session_id);
                        drop(gate);

                        self.request_more_input(&state).await;
                        return Ok(DrainExit::AwaitingInput);
                    }
                    DrainStep::Process => {}
                }

                let Some(candidate) = state.processing_queue.pop_front() else {
                    continue;
                };
                state.processed_count += 1;
                self.deps.store.save(&state).await?;
                self.deps
                    .publisher
                    .publish(ScanEvent::Progress(state.progress(self.config.safety_cap)));
                candidate
            };

            tracing::debug!(
                session_id = %session_id,
                url = %candidate.url,
                "Analyzing candidate"
            );
            let lead = AnalysisPipeline::new(self.deps.analyzer.as_ref(), &self.config)
                .qualify(&candidate)
                .await;

            if let Some(lead) = lead {
                self.record_lead(session_id, lead).await?;
            }

            sleep(self.config.inter_step_delay).await;
        }
    }

    async fn record_lead(&self, session_id: Uuid, lead: Lead) -> Result<()> {
        let _gate = self.gate.lock().await;
        let mut state = self.deps.store.load().await?;

        if state.session_id != session_id || state.is_finished() {
            tracing::debug!(
                session_id = %session_id,
                website = %lead.website,
                "Session changed during analysis, discarding lead"
            );
            return Ok(());
        }

        state.qualified_leads.push(lead.clone());
        self.deps.store.save(&state).await?;

        tracing::info!(
            session_id = %session_id,
            name = %lead.name,
            website = %lead.website,
            qualified = state.qualified_leads.len(),
            "Qualified lead"
        );
        self.deps.publisher.publish(ScanEvent::LeadFound { lead });
        self.deps
            .publisher
            .publish(ScanEvent::Progress(state.progress(self.config.safety_cap)));
        Ok(())
    }

    async fn request_more_input(&self, state: &ScanState) {
        let Some(context) = state.session_target.as_ref() else {
            tracing::warn!(
                session_id = %state.session_id,
                "Queue drained but no context to request more input from"
            );
            return;
        };

        tracing::info!(
            session_id = %state.session_id,
            context = %context,
            scanned = state.scanned_domains.len(),
            "Queue drained, requesting more input"
        );
        if let Err(e) = self.deps.requester.request_more_input(context).await {
            tracing::debug!(context = %context, error = %e, "More-input request not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::{
        signup_page, FailingStore, RecordingPublisher, RecordingRequester, ScriptedAnalyzer,
    };
    use crate::types::PageAnalysis;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct Harness {
        orchestrator: ScanOrchestrator,
        store: Arc<MemoryStore>,
        analyzer: Arc<ScriptedAnalyzer>,
        publisher: Arc<RecordingPublisher>,
        requester: Arc<RecordingRequester>,
    }

    fn harness(analyzer: ScriptedAnalyzer, config: ScanConfig) -> Harness {
        harness_with_requester(analyzer, config, RecordingRequester::new())
    }

    fn harness_with_requester(
        analyzer: ScriptedAnalyzer,
        config: ScanConfig,
        requester: RecordingRequester,
    ) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let analyzer = Arc::new(analyzer);
        let publisher = Arc::new(RecordingPublisher::new());
        let requester = Arc::new(requester);
        let orchestrator = ScanOrchestrator::new(
            ScanDeps {
                store: store.clone(),
                analyzer: analyzer.clone(),
                publisher: publisher.clone(),
                requester: requester.clone(),
            },
            config,
        );
        Harness {
            orchestrator,
            store,
            analyzer,
            publisher,
            requester,
        }
    }

    fn ad(url: &str) -> AdCandidate {
        AdCandidate::new(url, url)
    }

    fn tab() -> Option<ContextHandle> {
        Some(ContextHandle::from("tab-1"))
    }

    fn state_with(queue: usize, scanned: usize, leads: usize) -> ScanState {
        let mut state = ScanState::new_session(None);
        for i in 0..scanned {
            state.scanned_domains.insert(format!("d{i}.com"));
        }
        for i in 0..queue {
            state.processing_queue.push_back(ad(&format!("https://d{i}.com")));
        }
        let lead = build_test_lead();
        state.qualified_leads = vec![lead; leads];
        state
    }

    fn build_test_lead() -> Lead {
        crate::pipeline::build_lead(
            &ad("https://x.com"),
            &signup_page("password_fields"),
            None,
            Default::default(),
        )
    }

    #[test]
    fn test_next_step_decisions() {
        let config = ScanConfig::default().with_safety_cap(3);

        assert_eq!(next_step(&state_with(1, 3, 0), &config), DrainStep::Process);
        assert_eq!(next_step(&state_with(0, 2, 0), &config), DrainStep::AwaitInput);
        assert_eq!(
            next_step(&state_with(0, 3, 0), &config),
            DrainStep::Finish(FinishReason::SafetyCapReached)
        );
    }

    #[test]
    fn test_success_target_checked_before_queue() {
        let config = ScanConfig::default().with_safety_cap(10).with_success_target(2);

        assert_eq!(next_step(&state_with(5, 5, 1), &config), DrainStep::Process);
        assert_eq!(
            next_step(&state_with(5, 5, 2), &config),
            DrainStep::Finish(FinishReason::TargetReached)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_to_cap_finishes_session() {
        let h = harness(
            ScriptedAnalyzer::new().with_landing("https://b.com", signup_page("password_fields")),
            ScanConfig::default().with_safety_cap(2),
        );
        h.orchestrator.start_session(tab()).await.unwrap();

        let receipt = h
            .orchestrator
            .process_batch(vec![ad("https://a.com"), ad("https://b.com")], None)
            .await
            .unwrap();
        let exit = receipt.drain.unwrap().wait().await.unwrap();

        assert_eq!(exit, DrainExit::Finished(FinishReason::SafetyCapReached));
        let state = h.store.load().await.unwrap();
        assert!(!state.is_processing());
        assert_eq!(state.qualified_leads.len(), 1);
        assert_eq!(
            h.publisher.completions(),
            vec![ScanEvent::ScanComplete {
                qualified_count: 1,
                total_scanned: 2,
                reason: FinishReason::SafetyCapReached,
            }]
        );
        assert!(h.requester.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_below_cap_requests_more_input() {
        let h = harness(ScriptedAnalyzer::new(), ScanConfig::default().with_safety_cap(10));
        h.orchestrator.start_session(tab()).await.unwrap();

        let receipt = h
            .orchestrator
            .process_batch(vec![ad("https://a.com")], None)
            .await
            .unwrap();
        let exit = receipt.drain.unwrap().wait().await.unwrap();

        assert_eq!(exit, DrainExit::AwaitingInput);
        assert_eq!(h.requester.requests(), vec![ContextHandle::from("tab-1")]);
        assert!(h.publisher.completions().is_empty());
        assert_eq!(
            h.store.load().await.unwrap().phase,
            ScanPhase::AwaitingMoreInput
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_context_skips_request() {
        let h = harness(ScriptedAnalyzer::new(), ScanConfig::default());
        h.orchestrator.start_session(None).await.unwrap();

        let receipt = h
            .orchestrator
            .process_batch(vec![ad("https://a.com")], None)
            .await
            .unwrap();

        assert_eq!(receipt.drain.unwrap().wait().await.unwrap(), DrainExit::AwaitingInput);
        assert!(h.requester.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undeliverable_request_leaves_session_waiting() {
        let h = harness_with_requester(
            ScriptedAnalyzer::new(),
            ScanConfig::default().with_safety_cap(10),
            RecordingRequester::unreachable(),
        );
        h.orchestrator.start_session(tab()).await.unwrap();

        let receipt = h
            .orchestrator
            .process_batch(vec![ad("https://a.com")], None)
            .await
            .unwrap();
        let exit = receipt.drain.unwrap().wait().await.unwrap();

        assert_eq!(exit, DrainExit::AwaitingInput);
        assert_eq!(h.requester.requests(), vec![ContextHandle::from("tab-1")]);
        assert!(h.publisher.completions().is_empty());
        assert_eq!(
            h.store.load().await.unwrap().phase,
            ScanPhase::AwaitingMoreInput
        );

        let next = h
            .orchestrator
            .process_batch(vec![ad("https://b.com")], None)
            .await
            .unwrap();
        assert_eq!(next.drain.unwrap().wait().await.unwrap(), DrainExit::AwaitingInput);
        assert_eq!(h.requester.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyzer_failure_moves_on_after_delay() {
        let h = harness(
            ScriptedAnalyzer::new()
                .failing("https://a.com")
                .with_landing("https://b.com", signup_page("email_input_fields")),
            ScanConfig::default().with_safety_cap(2),
        );
        h.orchestrator.start_session(tab()).await.unwrap();

        let start = tokio::time::Instant::now();
        let receipt = h
            .orchestrator
            .process_batch(vec![ad("https://a.com"), ad("https://b.com")], None)
            .await
            .unwrap();
        receipt.drain.unwrap().wait().await.unwrap();

        let state = h.store.load().await.unwrap();
        assert_eq!(state.qualified_leads.len(), 1);
        assert_eq!(state.qualified_leads[0].website, "https://b.com");
        assert_eq!(state.processed_count, 2);
        assert!(start.elapsed() >= Duration::from_millis(4000));
        assert_eq!(h.analyzer.landing_calls(), vec!["https://a.com", "https://b.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_batch_joins_running_drain() {
        let h = harness(ScriptedAnalyzer::new(), ScanConfig::default().with_safety_cap(3));
        h.orchestrator.start_session(tab()).await.unwrap();

        let first = h
            .orchestrator
            .process_batch(vec![ad("https://a.com")], None)
            .await
            .unwrap();
        let second = h
            .orchestrator
            .process_batch(vec![ad("https://b.com"), ad("https://c.com")], None)
            .await
            .unwrap();

        assert!(second.drain.is_none());
        assert_eq!(second.report.admitted, 2);
        let exit = first.drain.unwrap().wait().await.unwrap();

        assert_eq!(exit, DrainExit::Finished(FinishReason::SafetyCapReached));
        assert_eq!(
            h.analyzer.landing_calls(),
            vec!["https://a.com", "https://b.com", "https://c.com"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_after_finish_is_ignored() {
        let h = harness(ScriptedAnalyzer::new(), ScanConfig::default().with_safety_cap(1));
        h.orchestrator.start_session(tab()).await.unwrap();
        let receipt = h
            .orchestrator
            .process_batch(vec![ad("https://a.com")], None)
            .await
            .unwrap();
        receipt.drain.unwrap().wait().await.unwrap();

        let late = h
            .orchestrator
            .process_batch(vec![ad("https://b.com")], None)
            .await
            .unwrap();

        assert!(late.drain.is_none());
        assert_eq!(late.report.admitted, 0);
        assert_eq!(h.publisher.completions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_finishes_once() {
        let h = harness(ScriptedAnalyzer::new(), ScanConfig::default());
        h.orchestrator.start_session(tab()).await.unwrap();

        let stopped = h.orchestrator.stop().await.unwrap();
        h.orchestrator.stop().await.unwrap();

        assert_eq!(stopped.phase, ScanPhase::Finished(FinishReason::Stopped));
        assert_eq!(h.publisher.completions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_target_ends_session_early() {
        let h = harness(
            ScriptedAnalyzer::new().with_landing("https://a.com", signup_page("password_fields")),
            ScanConfig::default().with_safety_cap(10).with_success_target(1),
        );
        h.orchestrator.start_session(tab()).await.unwrap();

        let receipt = h
            .orchestrator
            .process_batch(vec![ad("https://a.com"), ad("https://b.com")], None)
            .await
            .unwrap();

        assert_eq!(
            receipt.drain.unwrap().wait().await.unwrap(),
            DrainExit::Finished(FinishReason::TargetReached)
        );
        assert_eq!(h.analyzer.landing_calls(), vec!["https://a.com"]);
    }

    #[tokio::test]
    async fn test_failed_save_starts_no_drain() {
        let store = Arc::new(FailingStore::with_state(ScanState::new_session(tab())));
        store.set_failing(true);
        let publisher = Arc::new(RecordingPublisher::new());
        let orchestrator = ScanOrchestrator::new(
            ScanDeps {
                store: store.clone(),
                analyzer: Arc::new(ScriptedAnalyzer::new()),
                publisher: publisher.clone(),
                requester: Arc::new(RecordingRequester::new()),
            },
            ScanConfig::default(),
        );

        let result = orchestrator
            .process_batch(vec![ad("https://a.com")], None)
            .await;

        assert!(result.is_err());
        assert!(store.load().await.unwrap().scanned_domains.is_empty());
        assert!(publisher.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_restarts_interrupted_drain() {
        let mut interrupted = ScanState::new_session(tab());
        interrupted.phase = ScanPhase::Draining;
        interrupted.scanned_domains.insert("a.com".to_string());
        interrupted.processing_queue.push_back(ad("https://a.com"));

        let h = harness(ScriptedAnalyzer::new(), ScanConfig::default().with_safety_cap(1));
        h.store.save(&interrupted).await.unwrap();

        let task = h.orchestrator.resume().await.unwrap().unwrap();
        assert!(h.orchestrator.resume().await.unwrap().is_none());

        assert_eq!(
            task.wait().await.unwrap(),
            DrainExit::Finished(FinishReason::SafetyCapReached)
        );
        assert_eq!(h.analyzer.landing_calls(), vec!["https://a.com"]);
    }

    /// Holds every analysis until released.
    #[derive(Default)]
    struct HeldAnalyzer {
        entered: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl PageAnalyzer for HeldAnalyzer {
        async fn analyze(
            &self,
            _request: &crate::traits::AnalysisRequest,
        ) -> std::result::Result<PageAnalysis, crate::error::AnalysisError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(signup_page("password_fields"))
        }
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_result() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = Arc::new(HeldAnalyzer::default());
        let publisher = Arc::new(RecordingPublisher::new());
        let orchestrator = ScanOrchestrator::new(
            ScanDeps {
                store: store.clone(),
                analyzer: analyzer.clone(),
                publisher: publisher.clone(),
                requester: Arc::new(RecordingRequester::new()),
            },
            ScanConfig::default().with_inter_step_delay(Duration::ZERO),
        );
        orchestrator.start_session(tab()).await.unwrap();

        let receipt = orchestrator
            .process_batch(vec![ad("https://a.com")], None)
            .await
            .unwrap();
        analyzer.entered.notified().await;

        let fresh = orchestrator
            .start_session(Some(ContextHandle::from("tab-2")))
            .await
            .unwrap();
        analyzer.release.notify_one();

        assert_eq!(receipt.drain.unwrap().wait().await.unwrap(), DrainExit::Abandoned);
        let state = store.load().await.unwrap();
        assert_eq!(state.session_id, fresh.session_id);
        assert!(state.qualified_leads.is_empty());
        assert!(!publisher
            .events()
            .iter()
            .any(|e| matches!(e, ScanEvent::LeadFound { .. })));
    }
}
