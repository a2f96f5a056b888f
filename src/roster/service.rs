use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::types::{WorkerHandle, WorkerState, now_ms};

/// Attempts a TCP connection within `timeout`. The connection is dropped immediately.
pub async fn probe(addr: &str, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

pub struct Roster {
    addresses: Vec<String>,
    health: DashMap<String, WorkerHandle>,
    probe_timeout: Duration,
}

impl Roster {
    pub fn new(addresses: Vec<String>, probe_timeout: Duration) -> Arc<Self> {
        let mut unique: Vec<String> = Vec::with_capacity(addresses.len());
        for addr in addresses {
            if unique.contains(&addr) {
                tracing::warn!("Ignoring duplicate roster entry {}", addr);
                continue;
            }
            unique.push(addr);
        }

        let health = DashMap::new();
        for addr in &unique {
            health.insert(addr.clone(), WorkerHandle::new(addr.clone()));
        }

        Arc::new(Self {
            addresses: unique,
            health,
            probe_timeout,
        })
    }

    /// Roster entries in configuration order.
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn handle(&self, addr: &str) -> Option<WorkerHandle> {
        self.health.get(addr).map(|entry| entry.value().clone())
    }

    /// Health table in roster order.
    pub fn snapshot(&self) -> Vec<WorkerHandle> {
        self.addresses
            .iter()
            .filter_map(|addr| self.handle(addr))
            .collect()
    }

    pub fn healthy_count(&self) -> usize {
        self.health
            .iter()
            .filter(|entry| entry.value().state == WorkerState::Connected)
            .count()
    }

    pub fn mark_healthy(&self, addr: &str) {
        if let Some(mut handle) = self.health.get_mut(addr) {
            if handle.state != WorkerState::Connected {
                tracing::info!("Worker {} is reachable", addr);
            }
            handle.state = WorkerState::Connected;
            handle.last_healthy_ms = Some(now_ms());
            handle.consecutive_failures = 0;
        }
    }

    pub fn mark_failed(&self, addr: &str) {
        if let Some(mut handle) = self.health.get_mut(addr) {
            if handle.state != WorkerState::Disconnected {
                tracing::warn!("Worker {} marked disconnected", addr);
            }
            handle.state = WorkerState::Disconnected;
            handle.consecutive_failures = handle.consecutive_failures.saturating_add(1);
        }
    }

    /// Probes one roster member and records the outcome.
    ///
    /// A positive answer is only a hint: the worker may be gone by the time work is
    /// dispatched to it.
    pub async fn probe(&self, addr: &str) -> bool {
        let reachable = probe(addr, self.probe_timeout).await;
        if reachable {
            self.mark_healthy(addr);
        } else {
            self.mark_failed(addr);
        }
        tracing::debug!("Probe {} -> {}", addr, reachable);
        reachable
    }

    pub async fn probe_all(&self) -> usize {
        let probes = self.addresses.iter().map(|addr| self.probe(addr));
        let results = join_all(probes).await;
        results.into_iter().filter(|reachable| *reachable).count()
    }

    /// Periodically probes the whole roster and logs a summary line.
    pub fn spawn_monitor(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let roster = self.clone();
        tokio::spawn(async move {
            roster.monitor_loop(interval).await;
        })
    }

    async fn monitor_loop(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);

        loop {
            ticker.tick().await;
            let reachable = self.probe_all().await;
            tracing::info!("Roster stats: {}/{} workers reachable", reachable, self.len());

            for handle in self.snapshot() {
                tracing::debug!(
                    "  - {} state={:?} failures={}",
                    handle.addr,
                    handle.state,
                    handle.consecutive_failures
                );
            }
        }
    }
}
