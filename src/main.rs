use anyhow::Context;
use clap::{Parser, Subcommand};
use recommender_cluster::config::{CoordinatorArgs, FragmentWorkerArgs, WorkerArgs};
use recommender_cluster::coordinator::handlers::router;
use recommender_cluster::coordinator::service::Coordinator;
use recommender_cluster::dataset::loader::{LoadReport, load_ratings};
use recommender_cluster::dataset::types::Orientation;
use recommender_cluster::worker::fragment::FragmentWorker;
use recommender_cluster::worker::job::JobWorker;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "recommender-cluster",
    version,
    about = "Distributed collaborative-filtering cluster"
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "RECO_LOG", default_value = "info", global = true)]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API and dispatch jobs to the worker roster.
    Coordinator(CoordinatorArgs),
    /// Answer broadcast jobs with a scoring strategy.
    Worker(WorkerArgs),
    /// Pull fragments from a coordinator and return their mean rating.
    FragmentWorker(FragmentWorkerArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log)),
        )
        .init();

    match cli.command {
        Command::Coordinator(args) => run_coordinator(args).await,
        Command::Worker(args) => run_worker(args).await,
        Command::FragmentWorker(args) => {
            FragmentWorker::new(args.to_config()).run().await;
            Ok(())
        }
    }
}

async fn run_coordinator(args: CoordinatorArgs) -> anyhow::Result<()> {
    let config = args.to_config();

    // 1. Reference data:
    let report = load_dataset(args.dataset.clone()).await?;
    let coordinator = Coordinator::new(config, Arc::new(report.matrix));

    // 2. Roster monitor:
    if args.monitor_interval_secs > 0 {
        coordinator
            .roster()
            .spawn_monitor(Duration::from_secs(args.monitor_interval_secs));
    }

    // 3. Pull listener:
    if let Some(pull_bind) = args.pull_bind {
        let listener = TcpListener::bind(pull_bind)
            .await
            .with_context(|| format!("failed to bind pull listener on {}", pull_bind))?;
        tokio::spawn(coordinator.pull_server().clone().serve(listener));
    }

    // 4. HTTP API:
    let app = router(coordinator.clone(), coordinator.spawn_intake());
    let listener = TcpListener::bind(args.api_bind)
        .await
        .with_context(|| format!("failed to bind HTTP API on {}", args.api_bind))?;

    tracing::info!("HTTP API listening on {}", args.api_bind);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_worker(args: WorkerArgs) -> anyhow::Result<()> {
    let config = args.to_config();

    let local = match args.dataset.clone() {
        Some(path) => {
            let report = load_dataset(path).await?;
            Some(Arc::new(report.matrix))
        }
        None => None,
    };

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind worker listener on {}", args.bind))?;

    JobWorker::new(&config, local).serve(listener).await;
    Ok(())
}

async fn load_dataset(path: PathBuf) -> anyhow::Result<LoadReport> {
    let report = tokio::task::spawn_blocking(move || load_ratings(&path, Orientation::BySubject))
        .await
        .context("dataset loader task failed")??;
    Ok(report)
}
