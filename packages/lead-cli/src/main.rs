//! `lead-hunter`: drive a scan session from the terminal.
//!
//! Plays the host around the pipeline: replays scraped batch files as the
//! scraping collaborator, prints results as they arrive and exports CSV.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod batch;
mod cmd;

const DEFAULT_STATE: &str = "scan-state.json";

#[derive(Parser)]
#[command(name = "lead-hunter")]
#[command(about = "Find advertisers whose landing pages collect sign-ups")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session and feed it batch files, one per more-input request
    Run {
        /// JSON arrays of scraped ads, consumed in order
        #[arg(long = "batch", required = true, num_args = 1..)]
        batches: Vec<PathBuf>,

        #[arg(long, default_value = DEFAULT_STATE)]
        state: PathBuf,

        /// Write qualified leads here when the session ends
        #[arg(long)]
        out: Option<PathBuf>,

        /// Context handle recorded for the session
        #[arg(long, default_value = "cli")]
        context: String,

        /// Override LEAD_SAFETY_CAP
        #[arg(long)]
        safety_cap: Option<usize>,
    },

    /// Continue a session that was interrupted mid-drain
    Resume {
        /// Batch files to answer further more-input requests with
        #[arg(long = "batch")]
        batches: Vec<PathBuf>,

        #[arg(long, default_value = DEFAULT_STATE)]
        state: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Inspect or reset the persisted session
    #[command(subcommand)]
    State(cmd::state::StateCommand),

    /// Write the persisted leads as CSV
    Export {
        #[arg(long, default_value = DEFAULT_STATE)]
        state: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lead_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            batches,
            state,
            out,
            context,
            safety_cap,
        } => cmd::run::run(cmd::run::RunArgs {
            batches,
            state,
            out,
            context,
            safety_cap,
        })
        .await,
        Commands::Resume {
            batches,
            state,
            out,
        } => cmd::run::resume(batches, state, out).await,
        Commands::State(command) => cmd::state::execute(command).await,
        Commands::Export { state, out } => cmd::export::execute(&state, &out).await,
    }
}
