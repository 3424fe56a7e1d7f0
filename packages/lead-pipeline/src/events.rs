use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ContextHandle, FinishReason, Lead, ScanProgress};

/// Events emitted to the UI (facts about what happened)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScanEvent {
    SessionStarted {
        session_id: Uuid,
        context: Option<ContextHandle>,
    },

    /// Counters after a batch or a processed item
    Progress(ScanProgress),

    /// One qualified lead, sent as soon as it is known
    #[serde(rename = "result")]
    LeadFound { lead: Lead },

    ScanComplete {
        qualified_count: usize,
        total_scanned: usize,
        reason: FinishReason,
    },
}

impl ScanEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanEvent::ScanComplete { .. })
    }
}
