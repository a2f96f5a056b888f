//! Scoring Module Tests
//!
//! ## Test Scopes
//! - **Similarity**: full-norm vs co-rated cosine, zero vectors, fragment means.
//! - **Ranking**: descending score with ascending-ID tie-break.
//! - **Strategies**: item-cosine and user-neighbour recommendations on small matrices.

#[cfg(test)]
mod tests {
    use crate::dataset::types::{Orientation, RatingMatrix, RatingRecord};
    use crate::scoring::engine::{
        ItemCosine, ScoringStrategy, StrategyKind, UserNeighbor, rank_scores,
    };
    use crate::scoring::similarity::{co_rated, cosine_corated, cosine_full, mean_rating};
    use std::collections::HashMap;

    fn vector(pairs: &[(u32, f64)]) -> HashMap<u32, f64> {
        pairs.iter().copied().collect()
    }

    fn record(item_id: u32, subject_id: u32, rating: f64) -> RatingRecord {
        RatingRecord {
            item_id,
            subject_id,
            rating,
        }
    }

    /// Items 1 and 2 are rated identically by the same users; item 3 shares one user
    /// with them; item 4 has no user in common with anything else.
    fn movie_matrix() -> RatingMatrix {
        RatingMatrix::from_records(
            Orientation::BySubject,
            vec![
                record(1, 10, 5.0),
                record(1, 11, 4.0),
                record(2, 10, 5.0),
                record(2, 11, 4.0),
                record(3, 10, 2.0),
                record(3, 12, 5.0),
                record(4, 13, 5.0),
            ],
        )
    }

    // ============================================================
    // SIMILARITY TESTS
    // ============================================================

    #[test]
    fn test_cosine_identical_vectors_is_one() {
        let a = vector(&[(1, 3.0), (2, 4.0)]);
        assert!((cosine_full(&a, &a) - 1.0).abs() < 1e-12);
        assert!((cosine_corated(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_disjoint_vectors_is_zero() {
        let a = vector(&[(1, 3.0)]);
        let b = vector(&[(2, 4.0)]);
        assert_eq!(cosine_full(&a, &b), 0.0);
        assert_eq!(cosine_corated(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_empty_vector_is_zero() {
        let a = vector(&[]);
        let b = vector(&[(2, 4.0)]);
        assert_eq!(cosine_full(&a, &b), 0.0);
        assert_eq!(cosine_full(&b, &a), 0.0);
    }

    #[test]
    fn test_full_norm_penalises_partial_overlap() {
        // Overlap only on key 1; key 2 exists only in `a`.
        let a = vector(&[(1, 3.0), (2, 4.0)]);
        let b = vector(&[(1, 3.0)]);

        // Co-rated cosine only sees key 1: perfectly aligned.
        assert!((cosine_corated(&a, &b) - 1.0).abs() < 1e-12);
        // Full cosine: 9 / (5 * 3) = 0.6
        assert!((cosine_full(&a, &b) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_co_rated_count() {
        let a = vector(&[(1, 1.0), (2, 1.0), (3, 1.0)]);
        let b = vector(&[(2, 5.0), (3, 5.0), (4, 5.0)]);
        assert_eq!(co_rated(&a, &b), 2);
        assert_eq!(co_rated(&b, &a), 2);
    }

    #[test]
    fn test_mean_rating() {
        let records = vec![record(1, 1, 2.0), record(2, 1, 4.0), record(3, 2, 3.0)];
        assert!((mean_rating(&records) - 3.0).abs() < 1e-12);
        assert_eq!(mean_rating(&[]), 0.0);
    }

    // ============================================================
    // RANKING TESTS
    // ============================================================

    #[test]
    fn test_rank_scores_breaks_ties_by_ascending_id() {
        let ranked = rank_scores(vec![(7, 2.0), (5, 1.0), (6, 2.0), (8, 1.0)], 3);
        assert_eq!(ranked, vec![6, 7, 5]);
    }

    #[test]
    fn test_rank_scores_limit_larger_than_input() {
        let ranked = rank_scores(vec![(1, 0.5)], 10);
        assert_eq!(ranked, vec![1]);
        assert!(rank_scores(Vec::new(), 3).is_empty());
    }

    // ============================================================
    // STRATEGY TESTS
    // ============================================================

    #[test]
    fn test_item_cosine_prefers_most_similar_item() {
        let matrix = movie_matrix();

        let recommendations = ItemCosine.recommend(&[1], &matrix, 5);

        // Item 2 is a perfect match, item 3 overlaps partially, item 4 never.
        assert_eq!(recommendations, vec![2, 3]);
    }

    #[test]
    fn test_item_cosine_excludes_all_favorites() {
        let matrix = movie_matrix();

        let recommendations = ItemCosine.recommend(&[1, 2], &matrix, 5);

        assert!(!recommendations.contains(&1));
        assert!(!recommendations.contains(&2));
        assert_eq!(recommendations, vec![3]);
    }

    #[test]
    fn test_item_cosine_unknown_favorite_yields_nothing() {
        let matrix = movie_matrix();
        assert!(ItemCosine.recommend(&[999], &matrix, 5).is_empty());
    }

    #[test]
    fn test_item_cosine_works_on_item_oriented_matrix() {
        let by_subject = movie_matrix();
        let by_item = by_subject.transpose();

        assert_eq!(
            ItemCosine.recommend(&[1], &by_subject, 5),
            ItemCosine.recommend(&[1], &by_item, 5)
        );
    }

    #[test]
    fn test_user_neighbor_recommends_unseen_high_ratings() {
        // User 1 and user 2 agree on items 10 and 11; user 2 also loved 12 and
        // disliked 13. User 3 is unrelated.
        let matrix = RatingMatrix::from_records(
            Orientation::BySubject,
            vec![
                record(10, 1, 5.0),
                record(11, 1, 4.0),
                record(10, 2, 5.0),
                record(11, 2, 4.0),
                record(12, 2, 5.0),
                record(13, 2, 1.0),
                record(14, 3, 5.0),
            ],
        );
        let strategy = UserNeighbor { min_rating: 3.0 };

        assert_eq!(strategy.nearest_neighbor(&matrix, 1), Some(2));
        assert_eq!(strategy.recommend(&[1], &matrix, 5), vec![12]);
    }

    #[test]
    fn test_user_neighbor_tie_prefers_more_common_ratings() {
        // Users 2 and 3 both have cosine 1.0 with user 1, but user 3 shares two items.
        let matrix = RatingMatrix::from_records(
            Orientation::BySubject,
            vec![
                record(10, 1, 3.0),
                record(11, 1, 4.0),
                record(10, 2, 3.0),
                record(20, 2, 5.0),
                record(10, 3, 3.0),
                record(11, 3, 4.0),
                record(30, 3, 5.0),
            ],
        );
        let strategy = UserNeighbor { min_rating: 3.0 };

        assert_eq!(strategy.nearest_neighbor(&matrix, 1), Some(3));
        assert_eq!(strategy.recommend(&[1], &matrix, 5), vec![30]);
    }

    #[test]
    fn test_user_neighbor_unknown_user() {
        let matrix = movie_matrix();
        let strategy = UserNeighbor { min_rating: 3.0 };
        assert!(strategy.recommend(&[42], &matrix, 5).is_empty());
    }

    #[test]
    fn test_strategy_kind_builds_named_strategies() {
        assert_eq!(StrategyKind::ItemCosine.build(3.0).name(), "item-cosine");
        assert_eq!(StrategyKind::UserNeighbor.build(3.0).name(), "user-neighbor");
    }
}
