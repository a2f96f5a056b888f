//! Work Pool
//!
//! Holds the units of work of one pull-mode run and hands them out to workers.
//!
//! ## Responsibilities
//! - **Claiming**: `take` moves a fragment from pending to in-flight under a fresh lease.
//!   One mutex guards the whole pool, so two callers can never receive the same fragment.
//! - **Leasing**: a lease names one hand-out of a fragment. Results and failures are only
//!   accepted for the current lease; anything reported under an older one is stale.
//! - **Reassignment**: a failed fragment goes back to pending until its retry cap is hit,
//!   then it is abandoned and logged. While another host is waiting for work, a requeued
//!   fragment is not handed back to the host it failed on.
//! - **Completion tracking**: every fragment owns a `BarrierToken` that is released the
//!   moment it completes or is abandoned.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use super::barrier::{BarrierToken, CompletionBarrier};
use super::types::{FragmentOutcome, PullSummary};
use crate::dataset::types::RatingRecord;
use crate::wire::types::{FragmentId, WorkFragment};

/// How long a host that was told to wait still counts as waiting.
const WAITER_WINDOW: Duration = Duration::from_secs(1);

/// One hand-out of a fragment to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    pub fragment_id: FragmentId,
    /// 1 on the first hand-out, incremented on every reassignment.
    pub attempt: u32,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub fragment: WorkFragment,
    pub lease: Lease,
}

#[derive(Debug)]
pub enum Take {
    Assigned(Assignment),
    /// Nothing pending, but in-flight fragments may still come back.
    Wait,
    /// Nothing pending and nothing in flight.
    Drained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassignOutcome {
    Requeued,
    Abandoned,
    /// The lease was no longer current; nothing changed.
    Stale,
}

#[derive(Debug)]
struct Slot {
    fragment: WorkFragment,
    attempt: u32,
    /// Host of the worker the last attempt failed on.
    failed_on: Option<String>,
    token: BarrierToken,
}

#[derive(Debug)]
struct InFlight {
    slot: Slot,
    worker: String,
}

#[derive(Debug, Default)]
struct PoolState {
    pending: BTreeMap<FragmentId, Slot>,
    in_flight: HashMap<FragmentId, InFlight>,
    completed: BTreeMap<FragmentId, FragmentOutcome>,
    abandoned: BTreeSet<FragmentId>,
    waiters: HashMap<String, Instant>,
    next_id: FragmentId,
}

impl PoolState {
    fn holds_lease(&self, lease: &Lease) -> bool {
        matches!(
            self.in_flight.get(&lease.fragment_id),
            Some(entry) if entry.slot.attempt == lease.attempt
        )
    }

    /// Lowest pending fragment that did not last fail on `host`. Falls back to one that
    /// did when no other host is waiting for work.
    fn pick_for(&self, host: &str) -> Option<FragmentId> {
        let mut retry_here = None;
        for (id, slot) in &self.pending {
            if slot.failed_on.as_deref() != Some(host) {
                return Some(*id);
            }
            retry_here.get_or_insert(*id);
        }

        let others_waiting = self
            .waiters
            .iter()
            .any(|(waiter, since)| waiter != host && since.elapsed() < WAITER_WINDOW);
        if others_waiting { None } else { retry_here }
    }
}

/// The host part of an `ip:port` peer address.
fn host_of(peer: &str) -> &str {
    peer.rsplit_once(':').map_or(peer, |(host, _)| host)
}

pub struct WorkPool {
    state: Mutex<PoolState>,
    changed: Notify,
    barrier: Arc<CompletionBarrier>,
    max_reassignments: u32,
}

impl WorkPool {
    pub fn new(max_reassignments: u32) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            changed: Notify::new(),
            barrier: CompletionBarrier::new(),
            max_reassignments,
        }
    }

    /// Cleared once every fragment pushed so far has completed or been abandoned.
    pub fn barrier(&self) -> &Arc<CompletionBarrier> {
        &self.barrier
    }

    pub async fn push(&self, records: Vec<RatingRecord>) -> FragmentId {
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;
        state.pending.insert(
            id,
            Slot {
                fragment: WorkFragment { id, records },
                attempt: 0,
                failed_on: None,
                token: self.barrier.enlist(),
            },
        );
        drop(state);

        self.changed.notify_waiters();
        id
    }

    /// Splits `records` into fragments of at most `fragment_size` records.
    pub async fn seed(&self, records: Vec<RatingRecord>, fragment_size: usize) -> usize {
        let mut count = 0;
        for chunk in records.chunks(fragment_size.max(1)) {
            self.push(chunk.to_vec()).await;
            count += 1;
        }
        tracing::debug!("Seeded pool with {} fragments", count);
        count
    }

    /// Claims the lowest pending fragment for `worker`, an `ip:port` peer address.
    pub async fn take(&self, worker: &str) -> Take {
        let host = host_of(worker);
        let mut state = self.state.lock().await;

        if state.pending.is_empty() && state.in_flight.is_empty() {
            return Take::Drained;
        }
        let picked = state.pick_for(host);
        let Some((id, mut slot)) = picked.and_then(|id| state.pending.remove_entry(&id)) else {
            state.waiters.insert(host.to_string(), Instant::now());
            return Take::Wait;
        };
        state.waiters.remove(host);

        slot.attempt += 1;
        let lease = Lease {
            fragment_id: id,
            attempt: slot.attempt,
        };
        let fragment = slot.fragment.clone();
        state.in_flight.insert(
            id,
            InFlight {
                slot,
                worker: worker.to_string(),
            },
        );

        tracing::debug!("Fragment {} leased to {} (attempt {})", id, worker, lease.attempt);
        Take::Assigned(Assignment { fragment, lease })
    }

    /// Records a fragment's result. Returns false, and drops the value, when the lease
    /// is stale: the fragment was reassigned, abandoned, or already completed.
    pub async fn mark_complete(&self, lease: &Lease, value: f64) -> bool {
        let mut state = self.state.lock().await;
        if !state.holds_lease(lease) {
            tracing::debug!(
                "Discarding late result for fragment {} (attempt {})",
                lease.fragment_id,
                lease.attempt
            );
            return false;
        }
        let Some(entry) = state.in_flight.remove(&lease.fragment_id) else {
            return false;
        };

        state.completed.insert(
            lease.fragment_id,
            FragmentOutcome {
                value,
                records: entry.slot.fragment.records.len(),
                worker: entry.worker.clone(),
            },
        );
        drop(state);

        // Releases the fragment's barrier token.
        drop(entry);
        self.changed.notify_waiters();
        true
    }

    /// Returns a failed fragment to the pool, or abandons it once its reassignments are
    /// used up.
    pub async fn reassign(&self, lease: &Lease) -> ReassignOutcome {
        let mut state = self.state.lock().await;
        if !state.holds_lease(lease) {
            return ReassignOutcome::Stale;
        }
        let Some(entry) = state.in_flight.remove(&lease.fragment_id) else {
            return ReassignOutcome::Stale;
        };

        let outcome = if entry.slot.attempt > self.max_reassignments {
            tracing::error!(
                "Fragment {} abandoned after {} attempts (last worker {})",
                lease.fragment_id,
                entry.slot.attempt,
                entry.worker
            );
            state.abandoned.insert(lease.fragment_id);
            drop(state);
            drop(entry);
            ReassignOutcome::Abandoned
        } else {
            tracing::info!(
                "Fragment {} returned to the pool after failure on {}",
                lease.fragment_id,
                entry.worker
            );
            let mut slot = entry.slot;
            slot.failed_on = Some(host_of(&entry.worker).to_string());
            state.pending.insert(lease.fragment_id, slot);
            drop(state);
            ReassignOutcome::Requeued
        };

        self.changed.notify_waiters();
        outcome
    }

    /// Abandons everything not yet completed. Used when a run hits its deadline.
    pub async fn abandon_remaining(&self) -> usize {
        let mut state = self.state.lock().await;
        let pending = std::mem::take(&mut state.pending);
        let in_flight = std::mem::take(&mut state.in_flight);

        let ids: Vec<FragmentId> = pending.keys().chain(in_flight.keys()).copied().collect();
        state.abandoned.extend(ids.iter().copied());
        drop(state);

        drop(pending);
        drop(in_flight);
        self.changed.notify_waiters();
        ids.len()
    }

    /// Sleeps until the pool changes or `max_wait` elapses.
    pub async fn wait_for_change(&self, max_wait: Duration) {
        let _ = tokio::time::timeout(max_wait, self.changed.notified()).await;
    }

    pub async fn in_flight_count(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    pub async fn is_drained(&self) -> bool {
        let state = self.state.lock().await;
        state.pending.is_empty() && state.in_flight.is_empty()
    }

    pub async fn outcome(&self, id: FragmentId) -> Option<FragmentOutcome> {
        self.state.lock().await.completed.get(&id).cloned()
    }

    pub async fn summary(&self) -> PullSummary {
        let state = self.state.lock().await;

        let records: usize = state.completed.values().map(|o| o.records).sum();
        let weighted_sum: f64 = state
            .completed
            .values()
            .map(|o| o.value * o.records as f64)
            .sum();

        PullSummary {
            fragments: state.completed.len()
                + state.abandoned.len()
                + state.pending.len()
                + state.in_flight.len(),
            completed: state.completed.len(),
            abandoned: state.abandoned.iter().copied().collect(),
            records,
            weighted_mean: (records > 0).then(|| weighted_sum / records as f64),
            results: state
                .completed
                .iter()
                .map(|(id, outcome)| (*id, outcome.value))
                .collect(),
        }
    }
}

/// Workers already used by one broadcast job.
///
/// `assign` is the only way to claim a worker, so a worker can be picked as an alternate
/// by at most one failing unit, and never for a unit it already belongs to.
#[derive(Debug, Default)]
pub struct AssignmentSet {
    used: Mutex<HashSet<String>>,
}

impl AssignmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `addr`. False if it was already claimed.
    pub async fn assign(&self, addr: &str) -> bool {
        self.used.lock().await.insert(addr.to_string())
    }

    pub async fn is_assigned(&self, addr: &str) -> bool {
        self.used.lock().await.contains(addr)
    }

    pub async fn len(&self) -> usize {
        self.used.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.used.lock().await.is_empty()
    }
}
