//! Pull-Mode Dispatch
//!
//! Workers connect to the pull listener and ask for work. Each connection is served by
//! its own task: `Pull` -> `Fragment` -> `FragmentResult`, repeated until the active
//! run's pool is drained, then `Fin`.
//!
//! A worker that errors or goes silent loses its connection; the fragment it held goes
//! back to the pool through `WorkPool::reassign`.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;

use super::queue::{Assignment, ReassignOutcome, Take, WorkPool};
use super::types::PullSummary;
use crate::config::PullSettings;
use crate::dataset::types::RatingRecord;
use crate::error::{CoordinatorError, DispatchError, ProtocolError};
use crate::wire::codec::{read_message, write_message};
use crate::wire::types::{WireMessage, WorkFragment};

/// Re-check interval while a worker waits for in-flight fragments to settle.
const WAIT_SLICE: Duration = Duration::from_millis(250);
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

enum Served {
    Continue,
    Stop,
}

pub struct PullServer {
    active: RwLock<Option<Arc<WorkPool>>>,
    settings: PullSettings,
}

impl PullServer {
    pub fn new(settings: PullSettings) -> Arc<Self> {
        Arc::new(Self {
            active: RwLock::new(None),
            settings,
        })
    }

    pub async fn active_pool(&self) -> Option<Arc<WorkPool>> {
        self.active.read().await.clone()
    }

    /// Accepts worker connections forever.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Pull listener on {}", addr);
        }

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        server.handle_worker(stream, peer.to_string()).await;
                    });
                }
                Err(e) => {
                    tracing::warn!("Pull accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    /// Splits `records` into fragments, publishes them, and waits for the run to drain.
    ///
    /// Fragments still outstanding at the run deadline are abandoned. The returned summary
    /// lists them.
    pub async fn run(
        &self,
        records: Vec<RatingRecord>,
        fragment_size: usize,
    ) -> Result<PullSummary, CoordinatorError> {
        let pool = Arc::new(WorkPool::new(self.settings.max_reassignments));
        let count = {
            let mut active = self.active.write().await;
            if active.is_some() {
                return Err(CoordinatorError::RunInProgress);
            }
            let count = pool.seed(records, fragment_size).await;
            *active = Some(pool.clone());
            count
        };
        tracing::info!("Pull run started with {} fragments", count);

        let drained = tokio::time::timeout(self.settings.run_timeout, pool.barrier().wait())
            .await
            .is_ok();
        if !drained {
            let abandoned = pool.abandon_remaining().await;
            tracing::error!(
                "Pull run timed out after {:?}, abandoned {} fragments",
                self.settings.run_timeout,
                abandoned
            );
            pool.barrier().wait().await;
        }

        *self.active.write().await = None;

        let summary = pool.summary().await;
        tracing::info!(
            "Pull run finished: {}/{} fragments completed, {} abandoned",
            summary.completed,
            summary.fragments,
            summary.abandoned.len()
        );
        Ok(summary)
    }

    async fn handle_worker(&self, mut stream: TcpStream, peer: String) {
        tracing::debug!("Pull worker connected from {}", peer);

        loop {
            let idle = self.settings.exchange_timeout;
            let request = tokio::time::timeout(idle, read_message(&mut stream)).await;
            match request {
                Ok(Ok(WireMessage::Pull)) => {}
                Ok(Err(ProtocolError::Closed)) => {
                    tracing::debug!("Pull worker {} disconnected", peer);
                    return;
                }
                Ok(Ok(other)) => {
                    tracing::warn!("Pull worker {} sent {} instead of Pull", peer, other.kind());
                    return;
                }
                Ok(Err(e)) => {
                    tracing::warn!("Pull worker {} failed: {}", peer, e);
                    return;
                }
                Err(_) => {
                    tracing::warn!("Pull worker {} idle for too long", peer);
                    return;
                }
            }

            match self.serve_pull(&mut stream, &peer).await {
                Served::Continue => continue,
                Served::Stop => return,
            }
        }
    }

    /// Answers one `Pull`: either a fragment exchange or `Fin`.
    async fn serve_pull(&self, stream: &mut TcpStream, peer: &str) -> Served {
        let Some(pool) = self.active_pool().await else {
            self.send_fin(stream, peer).await;
            return Served::Stop;
        };

        loop {
            match pool.take(peer).await {
                Take::Assigned(Assignment { fragment, lease }) => {
                    return match self.exchange(stream, peer, &fragment).await {
                        Ok(value) => {
                            pool.mark_complete(&lease, value).await;
                            Served::Continue
                        }
                        Err(e) => {
                            tracing::warn!("Fragment {} failed on {}: {}", fragment.id, peer, e);
                            if pool.reassign(&lease).await == ReassignOutcome::Stale {
                                tracing::debug!("Fragment {} was already settled", fragment.id);
                            }
                            Served::Stop
                        }
                    };
                }
                Take::Wait => pool.wait_for_change(WAIT_SLICE).await,
                Take::Drained => {
                    self.send_fin(stream, peer).await;
                    return Served::Stop;
                }
            }
        }
    }

    async fn exchange(
        &self,
        stream: &mut TcpStream,
        peer: &str,
        fragment: &WorkFragment,
    ) -> Result<f64, DispatchError> {
        let deadline = self.settings.exchange_timeout;
        let reply = tokio::time::timeout(deadline, async {
            write_message(&mut *stream, &WireMessage::Fragment(fragment.clone())).await?;
            read_message(&mut *stream).await
        })
        .await
        .map_err(|_| DispatchError::Deadline {
            addr: peer.to_string(),
            timeout: deadline,
        })?
        .map_err(|source| DispatchError::Protocol {
            addr: peer.to_string(),
            source,
        })?;

        match reply {
            WireMessage::FragmentResult { fragment_id, value } if fragment_id == fragment.id => {
                Ok(value)
            }
            other => Err(DispatchError::Protocol {
                addr: peer.to_string(),
                source: ProtocolError::Unexpected {
                    expected: "FragmentResult",
                    got: other.kind(),
                },
            }),
        }
    }

    async fn send_fin(&self, stream: &mut TcpStream, peer: &str) {
        match write_message(stream, &WireMessage::Fin).await {
            Ok(()) => tracing::debug!("Sent Fin to {}", peer),
            Err(e) => tracing::debug!("Could not send Fin to {}: {}", peer, e),
        }
    }
}
