//! Worker Agents
//!
//! The two kinds of processes that do the actual computation.
//!
//! - **`job`**: listens for broadcast jobs, runs its scoring strategy and answers with a
//!   ranked candidate list. Stays up across connections and failed requests.
//! - **`fragment`**: connects to the coordinator's pull listener, processes fragments
//!   until told to stop, then reconnects after a fixed pause.

pub mod fragment;
pub mod job;
