use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use lead_pipeline::export::export_leads;
use lead_pipeline::{JsonFileStore, StateStore};

pub async fn execute(state: &Path, out: &Path) -> Result<()> {
    let record = JsonFileStore::new(state)
        .load()
        .await
        .with_context(|| format!("Failed to load {}", state.display()))?;

    if record.qualified_leads.is_empty() {
        println!("{}", "No qualified leads to export".yellow());
        return Ok(());
    }

    export_leads(out, &record.qualified_leads)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!(
        "{} {} leads to {}",
        "Exported".green(),
        record.qualified_leads.len(),
        out.display()
    );
    Ok(())
}
