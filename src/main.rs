//! Page-Lens main entry point
//!
//! This is the command-line interface for submitting and inspecting page analyses.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use page_lens::config::{load_config_with_hash, Config};
use page_lens::jobs::{JobError, JobEvent, Orchestrator};
use page_lens::output::{print_summary, render_json, render_record, summarize};
use page_lens::storage::{open_storage, MemoryStorage, RecordStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// Page-Lens: single-page web analysis
///
/// Fetches a page, reports its title, HTML version, heading counts and
/// login form, and probes every link on it. Each analysis is tracked as a
/// job whose record is kept in a local database.
#[derive(Parser, Debug)]
#[command(name = "page-lens")]
#[command(version)]
#[command(about = "Single-page web analysis", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep records in memory instead of the configured database
    #[arg(long)]
    in_memory: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one or more pages and wait for the results
    Analyze {
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },

    /// List every stored job with a status summary
    List,

    /// Print one job record as JSON
    Show { id: String },

    /// Run an existing job again
    Reanalyze { id: String },

    /// Delete a job and its record
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    if cli.in_memory {
        tracing::info!("Using in-memory record store");
        let orchestrator = Orchestrator::from_config(MemoryStorage::new(), &config.http)?;
        run(orchestrator, cli.command).await
    } else {
        let path = Path::new(&config.storage.database_path);
        tracing::info!("Opening database: {}", path.display());
        let storage = open_storage(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        let orchestrator = Orchestrator::from_config(storage, &config.http)?;
        run(orchestrator, cli.command).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_lens=info,warn"),
            1 => EnvFilter::new("page_lens=debug,info"),
            2 => EnvFilter::new("page_lens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

async fn run<S>(orchestrator: Orchestrator<S>, command: Command) -> anyhow::Result<()>
where
    S: RecordStore + Send + 'static,
{
    match command {
        Command::Analyze { urls } => handle_analyze(&orchestrator, &urls).await,
        Command::List => handle_list(&orchestrator),
        Command::Show { id } => handle_show(&orchestrator, &id),
        Command::Reanalyze { id } => handle_reanalyze(&orchestrator, &id).await,
        Command::Delete { id } => handle_delete(&orchestrator, &id),
    }
}

async fn handle_analyze<S>(orchestrator: &Orchestrator<S>, urls: &[String]) -> anyhow::Result<()>
where
    S: RecordStore + Send + 'static,
{
    let mut ids = Vec::with_capacity(urls.len());
    let events = orchestrator.subscribe();

    for url in urls {
        match orchestrator.submit(url) {
            Ok(record) => ids.push(record.id),
            Err(JobError::InvalidUrl(_)) => tracing::warn!("Skipping empty URL"),
            Err(e) => return Err(e.into()),
        }
    }

    if ids.is_empty() {
        bail!("No URLs to analyze");
    }

    wait_for_runs(orchestrator, events, &ids).await;
    print_records(orchestrator, &ids)
}

fn handle_list<S>(orchestrator: &Orchestrator<S>) -> anyhow::Result<()>
where
    S: RecordStore + Send + 'static,
{
    let records = orchestrator.list()?;
    for record in &records {
        println!("{}", render_record(record));
    }
    print_summary(&summarize(&records));
    Ok(())
}

fn handle_show<S>(orchestrator: &Orchestrator<S>, id: &str) -> anyhow::Result<()>
where
    S: RecordStore + Send + 'static,
{
    let record = orchestrator
        .get(id)?
        .ok_or_else(|| JobError::NotFound(id.to_string()))?;
    println!("{}", render_json(&record)?);
    Ok(())
}

async fn handle_reanalyze<S>(orchestrator: &Orchestrator<S>, id: &str) -> anyhow::Result<()>
where
    S: RecordStore + Send + 'static,
{
    let events = orchestrator.subscribe();
    let record = orchestrator.resubmit(id)?;
    let ids = [record.id];

    wait_for_runs(orchestrator, events, &ids).await;
    print_records(orchestrator, &ids)
}

fn handle_delete<S>(orchestrator: &Orchestrator<S>, id: &str) -> anyhow::Result<()>
where
    S: RecordStore + Send + 'static,
{
    if !orchestrator.remove(id)? {
        return Err(JobError::NotFound(id.to_string()).into());
    }
    println!("Deleted job {}", id);
    Ok(())
}

/// Waits until every run in `ids` has finished
///
/// The first Ctrl-C stops all runs still pending; their partial results
/// are still awaited.
async fn wait_for_runs<S>(
    orchestrator: &Orchestrator<S>,
    mut events: tokio::sync::broadcast::Receiver<JobEvent>,
    ids: &[String],
) where
    S: RecordStore + Send + 'static,
{
    let mut pending: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let mut stopping = false;

    while !pending.is_empty() {
        tokio::select! {
            _ = tokio::signal::ctrl_c(), if !stopping => {
                stopping = true;
                tracing::info!("Interrupted, stopping {} job(s)", pending.len());
                for id in &pending {
                    match orchestrator.stop(id) {
                        Ok(()) | Err(JobError::NotRunning(_)) => {}
                        Err(e) => tracing::warn!("Failed to stop job {}: {}", id, e),
                    }
                }
            }
            event = events.recv() => match event {
                Ok(JobEvent::RunFinished { id }) => {
                    pending.remove(id.as_str());
                }
                Ok(JobEvent::StatusChanged { id, status }) => {
                    tracing::debug!("Job {} is now {}", id, status);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Missed {} job events", skipped);
                    pending.retain(|id| orchestrator.registry().is_registered(id));
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

fn print_records<S>(orchestrator: &Orchestrator<S>, ids: &[String]) -> anyhow::Result<()>
where
    S: RecordStore + Send + 'static,
{
    for id in ids {
        if let Some(record) = orchestrator.get(id)? {
            println!("{}", render_record(&record));
        }
    }
    Ok(())
}
