//! Worker Roster & Health Module
//!
//! The coordinator knows its workers from static configuration; there is no discovery.
//! This module keeps the per-worker health it observes while working with them.
//!
//! ## Core Mechanisms
//! - **Probing**: a short-timeout TCP connect decides whether a worker is reachable.
//!   Used before reassigning work, and periodically by the background monitor.
//! - **Health state**: every successful exchange marks a worker `Connected`; every
//!   failed connect, timeout or protocol error marks it `Disconnected`.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
