//! Distributed Recommendation Cluster Library
//!
//! Core modules of a small collaborative-filtering cluster: one coordinator that owns
//! the rating data and the client API, and any number of worker agents that compute.
//! The binary (`main.rs`) wires them into the `coordinator`, `worker` and
//! `fragment-worker` commands.
//!
//! ## Architecture Modules
//!
//! - **`coordinator`**: job intake, broadcast dispatch with vote merging, pull-mode
//!   fragment runs, completion tracking, and the HTTP API.
//! - **`worker`**: the broadcast job worker and the pull-mode fragment worker.
//! - **`roster`**: the static worker list and the health observed for each entry.
//! - **`wire`**: length-prefixed bincode framing for every coordinator <-> worker message.
//! - **`scoring`**: similarity measures and the pluggable recommendation strategies.
//! - **`dataset`**: the rating matrix and its CSV loader.
//! - **`config`** / **`error`**: runtime settings and typed failures.

pub mod config;
pub mod coordinator;
pub mod dataset;
pub mod error;
pub mod roster;
pub mod scoring;
pub mod wire;
pub mod worker;
