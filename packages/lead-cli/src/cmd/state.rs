use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use lead_pipeline::{
    BroadcastPublisher, ContextHandle, JsonFileStore, ScanConfig, SessionController, StateStore,
};

#[derive(Subcommand)]
pub enum StateCommand {
    /// Print the persisted scan state as JSON
    Show {
        #[arg(long, default_value = crate::DEFAULT_STATE)]
        state: PathBuf,
    },

    /// Replace the persisted state with an empty session
    Reset {
        #[arg(long, default_value = crate::DEFAULT_STATE)]
        state: PathBuf,

        #[arg(long)]
        context: Option<String>,
    },
}

pub async fn execute(command: StateCommand) -> Result<()> {
    match command {
        StateCommand::Show { state } => {
            let store = JsonFileStore::new(state);
            let record = store
                .load()
                .await
                .with_context(|| format!("Failed to load {}", store.path().display()))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        StateCommand::Reset { state, context } => {
            let config = ScanConfig::from_env().context("Failed to load configuration")?;
            let sessions = SessionController::new(
                Arc::new(JsonFileStore::new(state)),
                Arc::new(BroadcastPublisher::new()),
                config.safety_cap,
            );
            let fresh = sessions.start_session(context.map(ContextHandle::new)).await?;
            println!("{} {}", "Reset to empty session".green(), fresh.session_id);
        }
    }
    Ok(())
}
