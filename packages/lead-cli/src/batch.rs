use anyhow::{Context, Result};
use std::path::Path;

use lead_pipeline::links::sanitize_candidate;
use lead_pipeline::AdCandidate;

/// Read a scraped batch file and keep only ads with a usable landing page.
pub fn load_batch(path: &Path) -> Result<Vec<AdCandidate>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    let raw: Vec<AdCandidate> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Batch file {} is not a JSON array of ads", path.display()))?;

    let total = raw.len();
    let candidates: Vec<AdCandidate> = raw.into_iter().filter_map(sanitize_candidate).collect();

    tracing::info!(
        path = %path.display(),
        total,
        usable = candidates.len(),
        "Loaded batch"
    );
    Ok(candidates)
}
