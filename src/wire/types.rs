use crate::dataset::types::{EntityId, ItemId, RatingMatrix, RatingRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unique identifier for a job request.
///
/// Wrapper around a UUID string; only used to correlate a worker's answer with the
/// job it was sent and to tag log lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl JobId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fragment identifier: monotonically increasing within one pull run.
pub type FragmentId = u64;

/// What a job worker receives in broadcast mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobPayload {
    pub job_id: JobId,
    /// Favorite items (or target users, depending on the worker's strategy).
    pub targets: Vec<EntityId>,
    /// How many candidates the worker should return.
    pub limit: usize,
    /// Shared reference data. `None` means "use your local copy".
    pub ratings: Option<Arc<RatingMatrix>>,
}

/// A bounded slice of the rating dataset: the unit of work in pull mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkFragment {
    pub id: FragmentId,
    pub records: Vec<RatingRecord>,
}

/// Every value exchanged between coordinator and workers.
///
/// One variant per logical message; see `codec` for how each is framed on the stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WireMessage {
    /// Coordinator -> job worker.
    Job(JobPayload),
    /// Job worker -> coordinator, ranked best first.
    Recommendations { job_id: JobId, items: Vec<ItemId> },
    /// Fragment worker -> coordinator: "give me work".
    Pull,
    /// Coordinator -> fragment worker.
    Fragment(WorkFragment),
    /// Fragment worker -> coordinator.
    FragmentResult { fragment_id: FragmentId, value: f64 },
    /// Termination sentinel. Ends the receiving side's work loop without error.
    Fin,
}

impl WireMessage {
    /// Short variant name for logs and protocol errors.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Job(_) => "Job",
            WireMessage::Recommendations { .. } => "Recommendations",
            WireMessage::Pull => "Pull",
            WireMessage::Fragment(_) => "Fragment",
            WireMessage::FragmentResult { .. } => "FragmentResult",
            WireMessage::Fin => "Fin",
        }
    }
}
