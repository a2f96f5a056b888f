//! Error Types
//!
//! Typed failures for each layer of the cluster. Dispatch and protocol errors are
//! absorbed inside the coordinator's per-unit tasks; only `CoordinatorError` ever
//! reaches the HTTP layer. Binaries and the long-running agent loops wrap these in
//! `anyhow::Error` at their edges.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures on a framed coordinator <-> worker connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer closed the stream cleanly on a frame boundary.
    #[error("connection closed by peer")]
    Closed,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[source] bincode::Error),

    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("unexpected message: expected {expected}, got {got}")]
    Unexpected {
        expected: &'static str,
        got: &'static str,
    },
}

/// Why a single dispatch exchange with a worker did not produce a result.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("worker {addr} did not answer within {timeout:?}")]
    Deadline { addr: String, timeout: Duration },

    #[error("protocol failure with {addr}: {source}")]
    Protocol {
        addr: String,
        #[source]
        source: ProtocolError,
    },
}

/// Errors surfaced to callers of the coordinator (and from there to API clients).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("the worker roster is empty")]
    EmptyRoster,

    #[error("no worker produced a result ({dispatched} dispatched)")]
    NoResponses { dispatched: usize },

    #[error("job intake is full")]
    IntakeFull,

    #[error("job intake is closed")]
    IntakeClosed,

    #[error("a fragment run is already in progress")]
    RunInProgress,

    #[error("no ratings loaded to fragment")]
    NothingToFragment,

    #[error("job could not be encoded: {0}")]
    Payload(#[from] ProtocolError),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("dataset has no header row")]
    MissingHeader,
}
