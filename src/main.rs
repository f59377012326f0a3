//! # LifeClaw — Deadline-Tracking Assistant Core
//!
//! Tracks real-world obligations (renewals, payments, deadlines), detects
//! approaching or missed deadlines, regenerates recurring obligations, and
//! delivers escalating push notifications.
//!
//! Usage:
//!   lifeclaw                       # Start gateway + sweep scheduler
//!   lifeclaw serve --port 8080     # Custom port
//!   lifeclaw sweep deadline        # Run one sweep and print its report

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lifeclaw_core::LifeClawConfig;
use lifeclaw_core::traits::PlanExtractor;
use lifeclaw_gateway::AppState;
use lifeclaw_intake::OpenAiExtractor;
use lifeclaw_lifecycle::LifecycleManager;
use lifeclaw_notify::{Dispatcher, HttpPushTransport};
use lifeclaw_scheduler::{SweepRunner, SweepScheduler};
use lifeclaw_store::SqliteStore;

#[derive(Parser)]
#[command(name = "lifeclaw", version, about = "📅 LifeClaw — deadline-tracking assistant core")]
struct Cli {
    /// Config file path (default: ~/.lifeclaw/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the gateway server and the sweep scheduler (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one sweep immediately and print its report
    Sweep {
        #[arg(value_enum)]
        job: SweepArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SweepArg {
    Deadline,
    Urgent,
    Renewal,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => {
            let expanded = shellexpand::tilde(path).to_string();
            LifeClawConfig::load_from(Path::new(&expanded))?
        }
        None => LifeClawConfig::load()?,
    };

    let db_path = shellexpand::tilde(&config.store.db_path).to_string();
    let store = Arc::new(SqliteStore::open(Path::new(&db_path))?);
    let manager = Arc::new(LifecycleManager::new(
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let transport = Arc::new(HttpPushTransport::new(&config.push));
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), transport));
    let runner = Arc::new(SweepRunner::new(manager.clone(), dispatcher.clone()));

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            let scheduler = Arc::new(tokio::sync::Mutex::new(SweepScheduler::new(
                &config.scheduler,
                runner.clone(),
            )));
            let handle = lifeclaw_scheduler::engine::start(
                scheduler.clone(),
                config.scheduler.check_interval_secs,
            );

            let extractor: Option<Arc<dyn PlanExtractor>> = config
                .extractor
                .enabled
                .then(|| Arc::new(OpenAiExtractor::new(&config.extractor)) as Arc<dyn PlanExtractor>);

            let state = Arc::new(AppState {
                manager,
                runner,
                scheduler,
                dispatcher,
                extractor,
                reminders: store.clone(),
                tasks: store.clone(),
                start_time: std::time::Instant::now(),
            });

            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            let served = lifeclaw_gateway::serve(state, &host, port).await;

            handle.stop().await;
            served?;
        }
        Command::Sweep { job } => {
            let report = match job {
                SweepArg::Deadline => serde_json::to_value(runner.deadline_sweep().await?)?,
                SweepArg::Urgent => serde_json::to_value(runner.urgent_sweep().await?)?,
                SweepArg::Renewal => serde_json::to_value(runner.renewal_sweep().await?)?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
