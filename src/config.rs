//! Runtime Configuration
//!
//! Every knob has a command-line flag and a `RECO_*` environment variable (flags win).
//! The `*Args` structs are what clap parses; the `*Config` structs are what the library
//! consumes, so tests and embedders can build them directly via `Default`.

use clap::{ArgAction, Args};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::engine::StrategyKind;

/// Timeouts and retry policy for broadcast dispatch.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub connect_timeout: Duration,
    /// Bounds the whole exchange with one worker: sending the job and reading its answer.
    pub dispatch_timeout: Duration,
    pub probe_timeout: Duration,
    /// How many alternates one unit of work may be handed to after its first worker fails.
    pub max_reassignments: u32,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            dispatch_timeout: Duration::from_secs(600),
            probe_timeout: Duration::from_secs(2),
            max_reassignments: 1,
        }
    }
}

/// Limits for pull-mode runs.
#[derive(Debug, Clone)]
pub struct PullSettings {
    /// Max wait for a connected worker's next message, and for a fragment's result.
    pub exchange_timeout: Duration,
    /// A run that has not drained by then abandons whatever is left.
    pub run_timeout: Duration,
    pub max_reassignments: u32,
}

impl Default for PullSettings {
    fn default() -> Self {
        Self {
            exchange_timeout: Duration::from_secs(600),
            run_timeout: Duration::from_secs(3600),
            max_reassignments: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub roster: Vec<String>,
    /// Number of roster entries a job is initially sent to. `None` means all of them.
    pub fanout: Option<usize>,
    pub dispatch: DispatchSettings,
    pub pull: PullSettings,
    /// Length of the final ranking returned to API clients.
    pub rank_limit: usize,
    /// Candidates requested from each worker.
    pub worker_limit: usize,
    /// Send the coordinator's rating matrix inside every job.
    pub ship_ratings: bool,
    pub fragment_size: usize,
    pub intake_capacity: usize,
    pub max_concurrent_jobs: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            roster: Vec::new(),
            fanout: None,
            dispatch: DispatchSettings::default(),
            pull: PullSettings::default(),
            rank_limit: 10,
            worker_limit: 5,
            ship_ratings: true,
            fragment_size: 1000,
            intake_capacity: 64,
            max_concurrent_jobs: 16,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    pub strategy: StrategyKind,
    pub limit: usize,
    pub min_rating: f64,
    /// An idle coordinator connection is closed after this long.
    pub idle_timeout: Duration,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::ItemCosine,
            limit: 5,
            min_rating: 3.0,
            idle_timeout: Duration::from_secs(900),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FragmentWorkerConfig {
    pub coordinator: String,
    pub connect_timeout: Duration,
    /// Fixed pause before reconnecting, after a failure or a finished run.
    pub retry: Duration,
    pub idle_timeout: Duration,
}

impl Default for FragmentWorkerConfig {
    fn default() -> Self {
        Self {
            coordinator: "127.0.0.1:9100".to_string(),
            connect_timeout: Duration::from_secs(5),
            retry: Duration::from_secs(2),
            idle_timeout: Duration::from_secs(900),
        }
    }
}

// ============================================================
// CLI ARGUMENTS
// ============================================================

#[derive(Debug, Clone, Args)]
pub struct CoordinatorArgs {
    /// Address of the HTTP API.
    #[arg(long, env = "RECO_API_BIND", default_value = "127.0.0.1:8080")]
    pub api_bind: SocketAddr,

    /// Ratings CSV (movieID,customerID,rating with a header row).
    #[arg(long, env = "RECO_DATASET")]
    pub dataset: PathBuf,

    /// Comma-separated worker addresses, in dispatch order.
    #[arg(long, env = "RECO_ROSTER", value_delimiter = ',', required = true)]
    pub roster: Vec<String>,

    #[arg(long, env = "RECO_FANOUT")]
    pub fanout: Option<usize>,

    /// Listener for pull-mode workers. Pull mode is disabled when unset.
    #[arg(long, env = "RECO_PULL_BIND")]
    pub pull_bind: Option<SocketAddr>,

    #[arg(long, env = "RECO_FRAGMENT_SIZE", default_value_t = 1000)]
    pub fragment_size: usize,

    #[arg(long, env = "RECO_DISPATCH_TIMEOUT_SECS", default_value_t = 600)]
    pub dispatch_timeout_secs: u64,

    #[arg(long, env = "RECO_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,

    #[arg(long, env = "RECO_PROBE_TIMEOUT_SECS", default_value_t = 2)]
    pub probe_timeout_secs: u64,

    #[arg(long, env = "RECO_MAX_REASSIGNMENTS", default_value_t = 1)]
    pub max_reassignments: u32,

    #[arg(long, env = "RECO_RUN_TIMEOUT_SECS", default_value_t = 3600)]
    pub run_timeout_secs: u64,

    #[arg(long, env = "RECO_RANK_LIMIT", default_value_t = 10)]
    pub rank_limit: usize,

    #[arg(long, env = "RECO_WORKER_LIMIT", default_value_t = 5)]
    pub worker_limit: usize,

    #[arg(long, env = "RECO_SHIP_RATINGS", default_value_t = true, action = ArgAction::Set)]
    pub ship_ratings: bool,

    #[arg(long, env = "RECO_INTAKE_CAPACITY", default_value_t = 64)]
    pub intake_capacity: usize,

    #[arg(long, env = "RECO_MAX_CONCURRENT_JOBS", default_value_t = 16)]
    pub max_concurrent_jobs: usize,

    /// Seconds between background roster probes. 0 disables the monitor.
    #[arg(long, env = "RECO_MONITOR_INTERVAL_SECS", default_value_t = 5)]
    pub monitor_interval_secs: u64,
}

impl CoordinatorArgs {
    pub fn to_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            roster: self.roster.clone(),
            fanout: self.fanout,
            dispatch: DispatchSettings {
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                dispatch_timeout: Duration::from_secs(self.dispatch_timeout_secs),
                probe_timeout: Duration::from_secs(self.probe_timeout_secs),
                max_reassignments: self.max_reassignments,
            },
            pull: PullSettings {
                exchange_timeout: Duration::from_secs(self.dispatch_timeout_secs),
                run_timeout: Duration::from_secs(self.run_timeout_secs),
                max_reassignments: self.max_reassignments,
            },
            rank_limit: self.rank_limit,
            worker_limit: self.worker_limit,
            ship_ratings: self.ship_ratings,
            fragment_size: self.fragment_size,
            intake_capacity: self.intake_capacity,
            max_concurrent_jobs: self.max_concurrent_jobs,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct WorkerArgs {
    #[arg(long, env = "RECO_BIND", default_value = "0.0.0.0:9002")]
    pub bind: SocketAddr,

    #[arg(long, env = "RECO_STRATEGY", value_enum, default_value_t = StrategyKind::ItemCosine)]
    pub strategy: StrategyKind,

    /// Local ratings CSV, used when jobs arrive without reference data.
    #[arg(long, env = "RECO_DATASET")]
    pub dataset: Option<PathBuf>,

    #[arg(long, env = "RECO_LIMIT", default_value_t = 5)]
    pub limit: usize,

    /// Lowest neighbour rating the user-neighbour strategy will recommend.
    #[arg(long, env = "RECO_MIN_RATING", default_value_t = 3.0)]
    pub min_rating: f64,

    #[arg(long, env = "RECO_IDLE_TIMEOUT_SECS", default_value_t = 900)]
    pub idle_timeout_secs: u64,
}

impl WorkerArgs {
    pub fn to_config(&self) -> JobWorkerConfig {
        JobWorkerConfig {
            strategy: self.strategy,
            limit: self.limit,
            min_rating: self.min_rating,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct FragmentWorkerArgs {
    /// Pull listener of the coordinator.
    #[arg(long, env = "RECO_COORDINATOR")]
    pub coordinator: String,

    #[arg(long, env = "RECO_RETRY_SECS", default_value_t = 2)]
    pub retry_secs: u64,

    #[arg(long, env = "RECO_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,

    #[arg(long, env = "RECO_IDLE_TIMEOUT_SECS", default_value_t = 900)]
    pub idle_timeout_secs: u64,
}

impl FragmentWorkerArgs {
    pub fn to_config(&self) -> FragmentWorkerConfig {
        FragmentWorkerConfig {
            coordinator: self.coordinator.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            retry: Duration::from_secs(self.retry_secs),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}
