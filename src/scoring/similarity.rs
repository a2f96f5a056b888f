use crate::dataset::types::{EntityId, RatingRecord};
use std::collections::HashMap;

/// Cosine similarity using each vector's full norm.
///
/// Ratings the other vector lacks still count towards the norm, so vectors that
/// overlap on a small part of their support score low.
pub fn cosine_full(a: &HashMap<EntityId, f64>, b: &HashMap<EntityId, f64>) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;

    for (key, rating_a) in a {
        if let Some(rating_b) = b.get(key) {
            dot += rating_a * rating_b;
        }
        norm_a += rating_a * rating_a;
    }
    let norm_b: f64 = b.values().map(|r| r * r).sum();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Cosine similarity restricted to co-rated keys.
pub fn cosine_corated(a: &HashMap<EntityId, f64>, b: &HashMap<EntityId, f64>) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (key, rating_a) in a {
        if let Some(rating_b) = b.get(key) {
            dot += rating_a * rating_b;
            norm_a += rating_a * rating_a;
            norm_b += rating_b * rating_b;
        }
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Number of keys present in both vectors.
pub fn co_rated(a: &HashMap<EntityId, f64>, b: &HashMap<EntityId, f64>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.keys().filter(|key| large.contains_key(key)).count()
}

/// Mean rating over a slice of records; 0.0 for an empty slice.
pub fn mean_rating(records: &[RatingRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.rating).sum::<f64>() / records.len() as f64
}
