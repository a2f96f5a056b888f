use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkerState {
    /// Never probed or dispatched to yet.
    Unknown,
    Connected,
    Disconnected,
}

/// A roster entry plus the transient health the coordinator has observed for it.
///
/// The address list itself is static configuration; only `state`,
/// `last_healthy_ms` and `consecutive_failures` change, and only through the
/// `Roster` (health prober and dispatch loop).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHandle {
    pub addr: String,
    pub state: WorkerState,
    /// Wall-clock millis of the last successful probe or exchange.
    pub last_healthy_ms: Option<u64>,
    pub consecutive_failures: u32,
}

impl WorkerHandle {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            state: WorkerState::Unknown,
            last_healthy_ms: None,
            consecutive_failures: 0,
        }
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
