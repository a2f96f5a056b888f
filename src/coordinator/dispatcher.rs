//! Broadcast Dispatch
//!
//! Sends one job to the first `fanout` roster workers concurrently and merges their
//! answers into a `VoteTally`.
//!
//! ## Responsibilities
//! - **Exchange**: connect, send the job frame, wait for the matching `Recommendations`
//!   within the dispatch deadline, then send `Fin`.
//! - **Reassignment**: when a worker fails, the unit moves to the next roster entry
//!   that is not yet part of this job and answers a probe, up to the reassignment cap.
//! - **Completion**: every unit holds a barrier token; the job is done when all are
//!   released, regardless of how many delivered.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use super::barrier::{BarrierToken, CompletionBarrier};
use super::queue::AssignmentSet;
use super::tally::VoteTally;
use crate::config::DispatchSettings;
use crate::dataset::types::ItemId;
use crate::error::{DispatchError, ProtocolError};
use crate::roster::service::Roster;
use crate::wire::codec::{encode_frame, read_message, write_frame, write_message};
use crate::wire::types::{JobId, JobPayload, WireMessage};

/// Upper bound for the courtesy `Fin` after a worker answered.
const FIN_TIMEOUT: Duration = Duration::from_secs(1);

pub struct BroadcastReport {
    pub job_id: JobId,
    pub dispatched: usize,
    pub contributors: usize,
    pub tally: Arc<VoteTally>,
}

pub struct BroadcastDispatcher {
    roster: Arc<Roster>,
    settings: DispatchSettings,
    fanout: Option<usize>,
}

impl BroadcastDispatcher {
    pub fn new(roster: Arc<Roster>, settings: DispatchSettings, fanout: Option<usize>) -> Self {
        Self {
            roster,
            settings,
            fanout,
        }
    }

    pub fn fanout(&self) -> usize {
        self.fanout
            .unwrap_or(self.roster.len())
            .min(self.roster.len())
    }

    /// Runs one job to completion and returns the merged votes.
    ///
    /// Only an unencodable payload fails the call; worker failures just lower the
    /// contributor count.
    pub async fn dispatch(&self, payload: JobPayload) -> Result<BroadcastReport, ProtocolError> {
        let job_id = payload.job_id.clone();
        let frame = encode_frame(&WireMessage::Job(payload))?;

        let job = Arc::new(JobContext {
            job_id: job_id.clone(),
            frame,
            roster: self.roster.clone(),
            settings: self.settings.clone(),
            tally: Arc::new(VoteTally::new()),
            assignments: AssignmentSet::new(),
        });

        let barrier = CompletionBarrier::new();
        let mut units = Vec::with_capacity(self.fanout());
        for addr in self.roster.addresses().iter().take(self.fanout()) {
            job.assignments.assign(addr).await;
            units.push((addr.clone(), barrier.enlist()));
        }

        let dispatched = units.len();
        tracing::info!(
            "Job {} dispatched to {} workers ({} bytes)",
            job_id,
            dispatched,
            job.frame.len()
        );

        for (addr, token) in units {
            let job = job.clone();
            tokio::spawn(async move {
                job.run_unit(addr, token).await;
            });
        }

        barrier.wait().await;

        let contributors = job.tally.contributions();
        tracing::info!(
            "Job {} complete: {}/{} units delivered",
            job_id,
            contributors,
            dispatched
        );

        Ok(BroadcastReport {
            job_id,
            dispatched,
            contributors,
            tally: job.tally.clone(),
        })
    }
}

/// State shared by every unit of one job.
struct JobContext {
    job_id: JobId,
    frame: Vec<u8>,
    roster: Arc<Roster>,
    settings: DispatchSettings,
    tally: Arc<VoteTally>,
    assignments: AssignmentSet,
}

impl JobContext {
    async fn run_unit(&self, first: String, token: BarrierToken) {
        let mut addr = first;
        let mut reassignments = 0;

        loop {
            match self.exchange(&addr).await {
                Ok(items) => {
                    self.roster.mark_healthy(&addr);
                    tracing::info!(
                        "Job {}: {} returned {} candidates",
                        self.job_id,
                        addr,
                        items.len()
                    );
                    self.tally.merge_votes(&items);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Job {}: {}", self.job_id, e);
                    self.roster.mark_failed(&addr);

                    if reassignments >= self.settings.max_reassignments {
                        tracing::error!(
                            "Job {}: work lost on {}, reassignment cap of {} reached",
                            self.job_id,
                            addr,
                            self.settings.max_reassignments
                        );
                        break;
                    }

                    match self.pick_alternate().await {
                        Some(alternate) => {
                            reassignments += 1;
                            tracing::info!(
                                "Job {}: reassigning from {} to {}",
                                self.job_id,
                                addr,
                                alternate
                            );
                            addr = alternate;
                        }
                        None => {
                            tracing::error!(
                                "Job {}: no healthy alternate for work lost on {}",
                                self.job_id,
                                addr
                            );
                            break;
                        }
                    }
                }
            }
        }

        token.complete();
    }

    /// First roster entry outside this job that answers a probe.
    async fn pick_alternate(&self) -> Option<String> {
        for candidate in self.roster.addresses() {
            if self.assignments.is_assigned(candidate).await {
                continue;
            }
            if !self.roster.probe(candidate).await {
                continue;
            }
            // Another failing unit may have claimed it while we probed.
            if self.assignments.assign(candidate).await {
                return Some(candidate.clone());
            }
        }
        None
    }

    async fn exchange(&self, addr: &str) -> Result<Vec<ItemId>, DispatchError> {
        let connect_timeout = self.settings.connect_timeout;
        let mut stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(DispatchError::Connect {
                    addr: addr.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(DispatchError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout: connect_timeout,
                });
            }
        };

        let deadline = self.settings.dispatch_timeout;
        let reply = tokio::time::timeout(deadline, async {
            write_frame(&mut stream, &self.frame).await?;
            read_message(&mut stream).await
        })
        .await
        .map_err(|_| DispatchError::Deadline {
            addr: addr.to_string(),
            timeout: deadline,
        })?
        .map_err(|source| protocol_error(addr, source))?;

        let items = match reply {
            WireMessage::Recommendations { job_id, items } if job_id == self.job_id => items,
            other => {
                return Err(protocol_error(
                    addr,
                    ProtocolError::Unexpected {
                        expected: "Recommendations",
                        got: other.kind(),
                    },
                ));
            }
        };

        if let Ok(Err(e)) =
            tokio::time::timeout(FIN_TIMEOUT, write_message(&mut stream, &WireMessage::Fin)).await
        {
            tracing::debug!("Job {}: could not send Fin to {}: {}", self.job_id, addr, e);
        }

        Ok(items)
    }
}

fn protocol_error(addr: &str, source: ProtocolError) -> DispatchError {
    DispatchError::Protocol {
        addr: addr.to_string(),
        source,
    }
}
