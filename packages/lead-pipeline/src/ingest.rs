//! Batch admission: batch-local dedup, then global dedup, then the safety cap.
//!
//! The order matters. Batch-local dedup keeps one brand from taking several
//! cap slots in a single batch; the cap runs last so a batch can be partially
//! admitted. Candidates cut off by the cap are dropped, not deferred.

use serde::Serialize;
use std::collections::HashSet;

use crate::domain::normalize_domain;
use crate::types::{AdCandidate, ScanState};

/// What happened to one incoming batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub received: usize,
    /// Left after batch-local dedup
    pub unique_in_batch: usize,
    /// Left after dropping domains already scanned this session
    pub new_domains: usize,
    pub admitted: usize,
    pub queue_len: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchIngestor {
    safety_cap: usize,
}

impl BatchIngestor {
    pub fn new(safety_cap: usize) -> Self {
        Self { safety_cap }
    }

    /// Admit the survivors of `batch` into `state`'s queue.
    pub fn ingest(&self, batch: Vec<AdCandidate>, state: &mut ScanState) -> IngestReport {
        let received = batch.len();

        let mut seen_in_batch = HashSet::new();
        let unique: Vec<(String, AdCandidate)> = batch
            .into_iter()
            .filter_map(|candidate| {
                let domain = normalize_domain(&candidate.url);
                seen_in_batch
                    .insert(domain.clone())
                    .then_some((domain, candidate))
            })
            .collect();
        let unique_in_batch = unique.len();

        let fresh: Vec<(String, AdCandidate)> = unique
            .into_iter()
            .filter(|(domain, _)| !state.scanned_domains.contains(domain))
            .collect();
        let new_domains = fresh.len();

        let mut admitted = 0;
        for (domain, candidate) in fresh {
            if state.scanned_domains.len() >= self.safety_cap {
                tracing::debug!(
                    domain = %domain,
                    safety_cap = self.safety_cap,
                    "Safety cap reached, dropping rest of batch"
                );
                break;
            }
            state.scanned_domains.insert(domain);
            state.processing_queue.push_back(candidate);
            admitted += 1;
        }

        IngestReport {
            received,
            unique_in_batch,
            new_domains,
            admitted,
            queue_len: state.processing_queue.len(),
        }
    }
}
