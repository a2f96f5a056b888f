use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc, oneshot};

use super::dispatcher::BroadcastDispatcher;
use super::pull::PullServer;
use super::types::{JobRequest, PullSummary, Recommendation};
use crate::config::CoordinatorConfig;
use crate::dataset::types::RatingMatrix;
use crate::error::CoordinatorError;
use crate::roster::service::Roster;
use crate::wire::types::{JobId, JobPayload};

/// Owns the roster, the reference ratings and both dispatch modes.
pub struct Coordinator {
    config: CoordinatorConfig,
    roster: Arc<Roster>,
    ratings: Arc<RatingMatrix>,
    dispatcher: BroadcastDispatcher,
    pull: Arc<PullServer>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig, ratings: Arc<RatingMatrix>) -> Arc<Self> {
        let roster = Roster::new(config.roster.clone(), config.dispatch.probe_timeout);
        let dispatcher =
            BroadcastDispatcher::new(roster.clone(), config.dispatch.clone(), config.fanout);
        let pull = PullServer::new(config.pull.clone());

        tracing::info!(
            "Coordinator ready: {} workers, fanout {}, {} rated subjects",
            roster.len(),
            dispatcher.fanout(),
            ratings.len()
        );

        Arc::new(Self {
            config,
            roster,
            ratings,
            dispatcher,
            pull,
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    pub fn pull_server(&self) -> &Arc<PullServer> {
        &self.pull
    }

    /// Broadcasts one job and ranks the merged votes.
    ///
    /// Fails with `NoResponses` when every unit of work was lost; a partial answer from
    /// the surviving workers is still a success.
    pub async fn recommend(&self, request: JobRequest) -> Result<Recommendation, CoordinatorError> {
        if self.roster.is_empty() {
            return Err(CoordinatorError::EmptyRoster);
        }

        let payload = JobPayload {
            job_id: JobId::new(),
            targets: request.favorites,
            limit: self.config.worker_limit,
            ratings: self.config.ship_ratings.then(|| self.ratings.clone()),
        };

        let report = self.dispatcher.dispatch(payload).await?;
        if report.contributors == 0 {
            return Err(CoordinatorError::NoResponses {
                dispatched: report.dispatched,
            });
        }

        let limit = request.limit.unwrap_or(self.config.rank_limit);
        Ok(Recommendation {
            job_id: report.job_id,
            items: report.tally.rank(limit),
            tally: report.tally.snapshot(),
            contributors: report.contributors,
            dispatched: report.dispatched,
        })
    }

    /// Fragments the loaded ratings and serves them to pull-mode workers until done.
    pub async fn run_fragments(&self) -> Result<PullSummary, CoordinatorError> {
        if self.ratings.is_empty() {
            return Err(CoordinatorError::NothingToFragment);
        }
        self.pull
            .run(self.ratings.records(), self.config.fragment_size)
            .await
    }

    /// Starts the intake loop and returns its submission handle.
    ///
    /// At most `max_concurrent_jobs` jobs run at once; beyond that, submissions queue up
    /// to `intake_capacity` and are then rejected with `IntakeFull`.
    pub fn spawn_intake(self: &Arc<Self>) -> JobIntake {
        let (tx, rx) = mpsc::channel(self.config.intake_capacity.max(1));
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_jobs.max(1)));
        let coordinator = self.clone();

        tokio::spawn(async move {
            coordinator.intake_loop(rx, permits).await;
        });

        JobIntake { tx }
    }

    async fn intake_loop(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<Submission>,
        permits: Arc<Semaphore>,
    ) {
        while let Some(submission) = rx.recv().await {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };

            let coordinator = self.clone();
            tokio::spawn(async move {
                let result = coordinator.recommend(submission.request).await;
                if submission.reply.send(result).is_err() {
                    tracing::debug!("Client went away before its job finished");
                }
                drop(permit);
            });
        }
        tracing::info!("Job intake closed");
    }
}

struct Submission {
    request: JobRequest,
    reply: oneshot::Sender<Result<Recommendation, CoordinatorError>>,
}

/// Cloneable handle for submitting jobs to the coordinator.
#[derive(Clone)]
pub struct JobIntake {
    tx: mpsc::Sender<Submission>,
}

impl JobIntake {
    /// Queues a job and waits for its result. Never blocks on a full queue.
    pub async fn submit(&self, request: JobRequest) -> Result<Recommendation, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(Submission { request, reply })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => CoordinatorError::IntakeFull,
                mpsc::error::TrySendError::Closed(_) => CoordinatorError::IntakeClosed,
            })?;

        rx.await.map_err(|_| CoordinatorError::IntakeClosed)?
    }
}
