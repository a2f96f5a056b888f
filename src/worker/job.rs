use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

use crate::config::JobWorkerConfig;
use crate::dataset::types::{ItemId, RatingMatrix};
use crate::error::ProtocolError;
use crate::scoring::engine::ScoringStrategy;
use crate::wire::codec::{read_message, write_message};
use crate::wire::types::{JobPayload, WireMessage};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Broadcast-mode worker: answers each `Job` with a ranked candidate list.
pub struct JobWorker {
    strategy: Arc<dyn ScoringStrategy>,
    local: Option<Arc<RatingMatrix>>,
    default_limit: usize,
    idle_timeout: Duration,
}

impl JobWorker {
    pub fn new(config: &JobWorkerConfig, local: Option<Arc<RatingMatrix>>) -> Arc<Self> {
        Arc::new(Self {
            strategy: config.strategy.build(config.min_rating),
            local,
            default_limit: config.limit,
            idle_timeout: config.idle_timeout,
        })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Serves coordinator connections forever. A bad connection never stops the listener.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Job worker ({}) listening on {}", self.strategy.name(), addr);
        }

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let worker = self.clone();
                    tokio::spawn(async move {
                        match worker.handle_connection(stream).await {
                            Ok(served) => tracing::debug!(
                                "Connection from {} closed after {} jobs",
                                peer,
                                served
                            ),
                            Err(e) => tracing::warn!("Connection from {} failed: {}", peer, e),
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    /// Answers jobs on one connection until `Fin`, a clean close, or the idle timeout.
    pub async fn handle_connection(&self, mut stream: TcpStream) -> Result<usize, ProtocolError> {
        let mut served = 0;

        loop {
            let read = tokio::time::timeout(self.idle_timeout, read_message(&mut stream)).await;
            let message = match read {
                Ok(Ok(message)) => message,
                Ok(Err(ProtocolError::Closed)) => return Ok(served),
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    tracing::debug!("Closing idle coordinator connection");
                    return Ok(served);
                }
            };

            match message {
                WireMessage::Job(payload) => {
                    let job_id = payload.job_id.clone();
                    tracing::info!("Job {}: {} targets", job_id, payload.targets.len());

                    let items = self.process(payload).await;
                    write_message(&mut stream, &WireMessage::Recommendations { job_id, items })
                        .await?;
                    served += 1;
                }
                WireMessage::Fin => return Ok(served),
                other => {
                    return Err(ProtocolError::Unexpected {
                        expected: "Job",
                        got: other.kind(),
                    });
                }
            }
        }
    }

    /// Runs the strategy on the job's ratings, or on the local copy when none were sent.
    pub async fn process(&self, payload: JobPayload) -> Vec<ItemId> {
        let Some(matrix) = payload.ratings.or_else(|| self.local.clone()) else {
            tracing::warn!("Job {} carried no ratings and none are loaded", payload.job_id);
            return Vec::new();
        };

        let limit = if payload.limit == 0 {
            self.default_limit
        } else {
            payload.limit
        };
        let strategy = self.strategy.clone();
        let targets = payload.targets;

        let scoring =
            tokio::task::spawn_blocking(move || strategy.recommend(&targets, &matrix, limit));
        match scoring.await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Scoring task for job {} failed: {}", payload.job_id, e);
                Vec::new()
            }
        }
    }
}
