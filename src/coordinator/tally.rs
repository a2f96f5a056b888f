use dashmap::DashMap;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dataset::types::ItemId;
use crate::scoring::engine::rank_scores;

/// Merges worker results for one job.
///
/// Additions commute, so the final scores do not depend on the order in which workers
/// answer. Each key is updated under its shard lock; there is no read-modify-write race.
#[derive(Debug, Default)]
pub struct VoteTally {
    scores: DashMap<ItemId, f64>,
    contributions: AtomicUsize,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one worker's weighted contribution.
    pub fn merge(&self, contribution: impl IntoIterator<Item = (ItemId, f64)>) {
        for (item, score) in contribution {
            *self.scores.entry(item).or_insert(0.0) += score;
        }
        self.contributions.fetch_add(1, Ordering::AcqRel);
    }

    /// Adds one vote per distinct item in a worker's candidate list.
    pub fn merge_votes(&self, items: &[ItemId]) {
        let mut seen = HashSet::with_capacity(items.len());
        self.merge(
            items
                .iter()
                .filter(|item| seen.insert(**item))
                .map(|item| (*item, 1.0)),
        );
    }

    /// Number of merged results, including empty ones.
    pub fn contributions(&self) -> usize {
        self.contributions.load(Ordering::Acquire)
    }

    pub fn score(&self, item: ItemId) -> Option<f64> {
        self.scores.get(&item).map(|entry| *entry.value())
    }

    pub fn snapshot(&self) -> BTreeMap<ItemId, f64> {
        self.scores
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Ranking by descending score, ties by ascending item ID.
    ///
    /// Call only after the job's barrier has cleared.
    pub fn rank(&self, limit: usize) -> Vec<ItemId> {
        rank_scores(self.snapshot(), limit)
    }
}
