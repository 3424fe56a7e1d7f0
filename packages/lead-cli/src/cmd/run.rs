use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use lead_pipeline::export::export_leads;
use lead_pipeline::{
    BroadcastPublisher, ChannelRequester, ContextHandle, DrainExit, DrainTask, HttpPageAnalyzer,
    JsonFileStore, PageAnalyzer, ScanConfig, ScanDeps, ScanError, ScanEvent, ScanOrchestrator,
    StateStore,
};

use crate::batch::load_batch;

pub struct RunArgs {
    pub batches: Vec<PathBuf>,
    pub state: PathBuf,
    pub out: Option<PathBuf>,
    pub context: String,
    pub safety_cap: Option<usize>,
}

struct Host {
    orchestrator: ScanOrchestrator,
    events: broadcast::Receiver<ScanEvent>,
    more_input: mpsc::UnboundedReceiver<ContextHandle>,
}

impl Host {
    fn build(state: PathBuf, config: ScanConfig) -> Result<Self> {
        let analyzer = HttpPageAnalyzer::from_http().context("Failed to create HTTP client")?;
        Ok(Self::assemble(
            Arc::new(JsonFileStore::new(state)),
            Arc::new(analyzer),
            config,
        ))
    }

    fn assemble(
        store: Arc<dyn StateStore>,
        analyzer: Arc<dyn PageAnalyzer>,
        config: ScanConfig,
    ) -> Self {
        let publisher = BroadcastPublisher::new();
        let events = publisher.subscribe();
        let (requester, more_input) = ChannelRequester::new();

        let orchestrator = ScanOrchestrator::new(
            ScanDeps {
                store,
                analyzer,
                publisher: Arc::new(publisher),
                requester: Arc::new(requester),
            },
            config,
        );

        Self {
            orchestrator,
            events,
            more_input,
        }
    }

    /// Answer more-input requests from `batches` until the session completes
    /// or the running drain loop fails.
    async fn drive(
        mut self,
        mut batches: VecDeque<PathBuf>,
        out: Option<PathBuf>,
        mut drain: Option<DrainTask>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Ok(event) => {
                        let done = event.is_terminal();
                        print_event(&event);
                        if done {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                exit = drain_exit(&mut drain) => {
                    drain = None;
                    match exit.context("Drain loop failed")? {
                        DrainExit::AwaitingInput => {}
                        DrainExit::Finished(_) | DrainExit::Abandoned => {
                            self.flush_events();
                            break;
                        }
                    }
                },
                Some(context) = self.more_input.recv() => match batches.pop_front() {
                    Some(path) => {
                        let candidates = load_batch(&path)?;
                        let receipt = self
                            .orchestrator
                            .process_batch(candidates, Some(context))
                            .await?;
                        if receipt.drain.is_some() {
                            drain = receipt.drain;
                        }
                    }
                    None => {
                        println!("{}", "No more batches, stopping scan".yellow());
                        self.orchestrator.stop().await?;
                        self.flush_events();
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    println!("{}", "Interrupted, stopping scan".yellow());
                    self.orchestrator.stop().await?;
                    self.flush_events();
                    break;
                }
            }
        }

        if let Some(out) = out {
            let state = self.orchestrator.snapshot().await?;
            export_leads(&out, &state.qualified_leads)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!(
                "{} {}",
                "Exported leads to".green(),
                out.display().to_string().bold()
            );
        }
        Ok(())
    }

    /// Print whatever is already buffered on the event stream.
    fn flush_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => print_event(&event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Event stream lagged");
                }
                Err(_) => break,
            }
        }
    }
}

/// Exit of the running drain loop; pending forever when there is none.
async fn drain_exit(drain: &mut Option<DrainTask>) -> Result<DrainExit, ScanError> {
    match drain {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = ScanConfig::from_env().context("Failed to load configuration")?;
    if let Some(cap) = args.safety_cap {
        config = config.with_safety_cap(cap);
    }

    let host = Host::build(args.state, config)?;
    let context = ContextHandle::new(args.context);
    let mut batches: VecDeque<PathBuf> = args.batches.into();

    host.orchestrator.start_session(Some(context.clone())).await?;

    let mut drain = None;
    if let Some(first) = batches.pop_front() {
        let candidates = load_batch(&first)?;
        drain = host
            .orchestrator
            .process_batch(candidates, Some(context))
            .await?
            .drain;
    }

    host.drive(batches, args.out, drain).await
}

pub async fn resume(batches: Vec<PathBuf>, state: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let config = ScanConfig::from_env().context("Failed to load configuration")?;
    let host = Host::build(state, config)?;

    let Some(drain) = host.orchestrator.resume().await? else {
        println!("{}", "Nothing to resume: no session was mid-drain".yellow());
        return Ok(());
    };

    host.drive(batches.into(), out, Some(drain)).await
}

fn print_event(event: &ScanEvent) {
    match event {
        ScanEvent::SessionStarted { session_id, .. } => {
            println!("{} {}", "Session".cyan(), session_id);
        }
        ScanEvent::Progress(progress) => {
            println!(
                "{} processed {} | qualified {} | scanned {}/{} | queued {}",
                "▸".dimmed(),
                progress.processed,
                progress.qualified,
                progress.scanned,
                progress.safety_cap,
                progress.queued
            );
        }
        ScanEvent::LeadFound { lead } => {
            let email = if lead.email.is_empty() {
                "no email".dimmed().to_string()
            } else {
                lead.email.clone()
            };
            println!(
                "{} {} {} ({})",
                "✔".bright_green().bold(),
                lead.name.bold(),
                lead.website,
                email
            );
        }
        ScanEvent::ScanComplete {
            qualified_count,
            total_scanned,
            reason,
        } => {
            println!(
                "{} {}: {} qualified out of {} scanned",
                "Scan complete".bright_cyan().bold(),
                reason,
                qualified_count,
                total_scanned
            );
        }
    }
}
