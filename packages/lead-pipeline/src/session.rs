use std::sync::Arc;

use crate::error::Result;
use crate::events::ScanEvent;
use crate::traits::{ProgressPublisher, StateStore};
use crate::types::{ContextHandle, FinishReason, ScanPhase, ScanState};

/// Owns the lifecycle boundaries of the scan state: create, reset, finish.
#[derive(Clone)]
pub struct SessionController {
    store: Arc<dyn StateStore>,
    publisher: Arc<dyn ProgressPublisher>,
    safety_cap: usize,
}

impl SessionController {
    pub fn new(
        store: Arc<dyn StateStore>,
        publisher: Arc<dyn ProgressPublisher>,
        safety_cap: usize,
    ) -> Self {
        Self {
            store,
            publisher,
            safety_cap,
        }
    }

    /// Discard whatever the previous session held and start an empty one.
    pub async fn start_session(&self, context: Option<ContextHandle>) -> Result<ScanState> {
        let state = ScanState::new_session(context);
        self.store.save(&state).await?;

        tracing::info!(
            session_id = %state.session_id,
            context = ?state.session_target,
            "Starting new scan session"
        );

        self.publisher.publish(ScanEvent::SessionStarted {
            session_id: state.session_id,
            context: state.session_target.clone(),
        });
        self.publisher
            .publish(ScanEvent::Progress(state.progress(self.safety_cap)));

        Ok(state)
    }

    /// Mark the session finished, persist, then announce completion.
    ///
    /// Nothing is published when the save fails.
    pub async fn finalize(&self, state: &mut ScanState, reason: FinishReason) -> Result<()> {
        let mut finished = state.clone();
        finished.phase = ScanPhase::Finished(reason);
        self.store.save(&finished).await?;
        *state = finished;

        tracing::info!(
            session_id = %state.session_id,
            reason = %reason,
            qualified = state.qualified_leads.len(),
            scanned = state.scanned_domains.len(),
            "Scan finished"
        );

        self.publisher.publish(ScanEvent::ScanComplete {
            qualified_count: state.qualified_leads.len(),
            total_scanned: state.scanned_domains.len(),
            reason,
        });

        Ok(())
    }
}
