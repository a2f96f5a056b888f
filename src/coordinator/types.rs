use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dataset::types::ItemId;
use crate::wire::types::{FragmentId, JobId};

/// A client's recommendation request after it left the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    pub favorites: Vec<ItemId>,
    /// Overrides the configured ranking length.
    pub limit: Option<usize>,
}

/// Final answer for one broadcast job.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub job_id: JobId,
    /// Ranked best first.
    pub items: Vec<ItemId>,
    /// Votes per candidate, as merged from every contributing worker.
    pub tally: BTreeMap<ItemId, f64>,
    /// Units of work that delivered a result.
    pub contributors: usize,
    /// Units of work created for the job.
    pub dispatched: usize,
}

/// Result of one completed fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentOutcome {
    pub value: f64,
    pub records: usize,
    pub worker: String,
}

/// What a pull-mode run produced once its barrier cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PullSummary {
    pub fragments: usize,
    pub completed: usize,
    pub abandoned: Vec<FragmentId>,
    /// Records covered by completed fragments.
    pub records: usize,
    /// Mean of the fragment values weighted by fragment size. `None` when nothing completed.
    pub weighted_mean: Option<f64>,
    pub results: BTreeMap<FragmentId, f64>,
}
