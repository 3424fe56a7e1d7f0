use serde::{Deserialize, Serialize};

use crate::types::{AdCandidate, ContextHandle};

/// Inbound messages from the scraping collaborator and the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScanCommand {
    StartScanSession {
        #[serde(default)]
        context: Option<ContextHandle>,
    },

    ProcessBatch {
        #[serde(alias = "ads")]
        candidates: Vec<AdCandidate>,
        #[serde(default)]
        context: Option<ContextHandle>,
    },

    StopScan,
}
