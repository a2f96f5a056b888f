use super::similarity::{co_rated, cosine_corated, cosine_full};
use crate::dataset::types::{EntityId, ItemId, Orientation, RatingMatrix};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A stateless recommendation policy a job worker applies to a rating matrix.
pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns at most `limit` item IDs, best first.
    fn recommend(&self, targets: &[EntityId], matrix: &RatingMatrix, limit: usize) -> Vec<ItemId>;
}

/// Selectable strategies for the `worker` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum StrategyKind {
    /// Targets are favorite items; scores other items by summed item-item cosine.
    ItemCosine,
    /// Targets are users; recommends what each user's nearest neighbour liked.
    UserNeighbor,
}

impl StrategyKind {
    pub fn build(self, min_rating: f64) -> Arc<dyn ScoringStrategy> {
        match self {
            StrategyKind::ItemCosine => Arc::new(ItemCosine),
            StrategyKind::UserNeighbor => Arc::new(UserNeighbor { min_rating }),
        }
    }
}

/// Orders scores descending, ties by ascending ID, and keeps the first `limit`.
pub fn rank_scores(scores: impl IntoIterator<Item = (ItemId, f64)>, limit: usize) -> Vec<ItemId> {
    let mut ranked: Vec<(ItemId, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(id, _)| id).collect()
}

/// Item-based collaborative filtering over favorite items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemCosine;

impl ScoringStrategy for ItemCosine {
    fn name(&self) -> &'static str {
        "item-cosine"
    }

    fn recommend(
        &self,
        favorites: &[EntityId],
        matrix: &RatingMatrix,
        limit: usize,
    ) -> Vec<ItemId> {
        let items = matrix.oriented(Orientation::ByItem);
        let excluded: HashSet<ItemId> = favorites.iter().copied().collect();
        let mut scores: HashMap<ItemId, f64> = HashMap::new();

        for favorite in favorites {
            let Some(favorite_vector) = items.get(*favorite) else {
                tracing::debug!("Favorite item {} has no ratings, ignoring", favorite);
                continue;
            };

            for (item, vector) in items.iter() {
                if excluded.contains(item) {
                    continue;
                }
                let similarity = cosine_full(favorite_vector, vector);
                if similarity > 0.0 {
                    *scores.entry(*item).or_insert(0.0) += similarity;
                }
            }
        }

        rank_scores(scores, limit)
    }
}

/// User-based nearest-neighbour recommendations.
#[derive(Debug, Clone, Copy)]
pub struct UserNeighbor {
    /// Minimum neighbour rating for an item to be recommended.
    pub min_rating: f64,
}

impl UserNeighbor {
    /// Most similar other user by co-rated cosine.
    ///
    /// Equal similarity prefers more co-rated items, then the lower user ID.
    pub fn nearest_neighbor(&self, users: &RatingMatrix, target: EntityId) -> Option<EntityId> {
        let target_vector = users.get(target)?;
        let mut best: Option<(EntityId, f64, usize)> = None;

        for (user, vector) in users.iter() {
            if *user == target {
                continue;
            }
            let similarity = cosine_corated(target_vector, vector);
            if similarity <= 0.0 {
                continue;
            }
            let common = co_rated(target_vector, vector);

            let better = match best {
                None => true,
                Some((best_user, best_similarity, best_common)) => {
                    similarity > best_similarity
                        || (similarity == best_similarity
                            && (common > best_common
                                || (common == best_common && *user < best_user)))
                }
            };
            if better {
                best = Some((*user, similarity, common));
            }
        }

        best.map(|(user, _, _)| user)
    }
}

impl ScoringStrategy for UserNeighbor {
    fn name(&self) -> &'static str {
        "user-neighbor"
    }

    fn recommend(&self, targets: &[EntityId], matrix: &RatingMatrix, limit: usize) -> Vec<ItemId> {
        let users = matrix.oriented(Orientation::BySubject);
        let mut seen: HashSet<ItemId> = HashSet::new();
        let mut recommendations = Vec::new();

        for target in targets {
            let Some(neighbor) = self.nearest_neighbor(&users, *target) else {
                tracing::debug!("No neighbour found for user {}", target);
                continue;
            };
            let Some(neighbor_ratings) = users.get(neighbor) else {
                continue;
            };
            let target_ratings = users.get(*target);

            let mut candidates: Vec<(ItemId, f64)> = neighbor_ratings
                .iter()
                .filter(|(item, rating)| {
                    **rating >= self.min_rating
                        && !target_ratings.is_some_and(|rated| rated.contains_key(*item))
                })
                .map(|(item, rating)| (*item, *rating))
                .collect();
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

            for (item, _) in candidates {
                if seen.insert(item) {
                    recommendations.push(item);
                }
            }
        }

        recommendations.truncate(limit);
        recommendations
    }
}
