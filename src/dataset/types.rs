//! Rating Data Types
//!
//! The sparse rating matrix every strategy reads, and the flat record form used when
//! the matrix is cut into work fragments.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a user or an item. Which one depends on the matrix orientation.
pub type EntityId = u32;

/// Identifier of a recommendable item.
pub type ItemId = EntityId;

/// Which entity kind keys the outer map of a `RatingMatrix`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Orientation {
    /// `subject (user) -> item -> rating`
    #[default]
    BySubject,
    /// `item -> subject (user) -> rating`
    ByItem,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::BySubject => Orientation::ByItem,
            Orientation::ByItem => Orientation::BySubject,
        }
    }
}

/// A single rating as it appears in the dataset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingRecord {
    pub item_id: ItemId,
    pub subject_id: EntityId,
    pub rating: f64,
}

/// Sparse two-level rating map.
///
/// Absent entries mean "unrated", never zero. The matrix is filled once by the
/// loader and then shared read-only (behind an `Arc`) by every task that needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RatingMatrix {
    orientation: Orientation,
    ratings: HashMap<EntityId, HashMap<EntityId, f64>>,
}

impl RatingMatrix {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ratings: HashMap::new(),
        }
    }

    /// Builds a matrix from records. Later duplicates overwrite earlier ones.
    pub fn from_records<I>(orientation: Orientation, records: I) -> Self
    where
        I: IntoIterator<Item = RatingRecord>,
    {
        let mut matrix = Self::new(orientation);
        for record in records {
            matrix.insert_record(record);
        }
        matrix
    }

    pub fn insert_record(&mut self, record: RatingRecord) {
        let (entity, counterpart) = match self.orientation {
            Orientation::BySubject => (record.subject_id, record.item_id),
            Orientation::ByItem => (record.item_id, record.subject_id),
        };
        self.ratings
            .entry(entity)
            .or_default()
            .insert(counterpart, record.rating);
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The rating vector of one entity.
    pub fn get(&self, entity: EntityId) -> Option<&HashMap<EntityId, f64>> {
        self.ratings.get(&entity)
    }

    pub fn rating(&self, entity: EntityId, counterpart: EntityId) -> Option<f64> {
        self.ratings.get(&entity)?.get(&counterpart).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &HashMap<EntityId, f64>)> {
        self.ratings.iter()
    }

    /// Number of outer entities.
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Total number of stored ratings.
    pub fn rating_count(&self) -> usize {
        self.ratings.values().map(HashMap::len).sum()
    }

    /// Same ratings keyed the other way round.
    pub fn transpose(&self) -> Self {
        let mut flipped = Self::new(self.orientation.flipped());
        for (entity, row) in &self.ratings {
            for (counterpart, rating) in row {
                flipped
                    .ratings
                    .entry(*counterpart)
                    .or_default()
                    .insert(*entity, *rating);
            }
        }
        flipped
    }

    /// Returns this matrix in the requested orientation, transposing only when needed.
    pub fn oriented(&self, orientation: Orientation) -> std::borrow::Cow<'_, Self> {
        if self.orientation == orientation {
            std::borrow::Cow::Borrowed(self)
        } else {
            std::borrow::Cow::Owned(self.transpose())
        }
    }

    /// Flattens the matrix into records ordered by (entity, counterpart).
    ///
    /// The ordering is what makes fragment contents reproducible between runs.
    pub fn records(&self) -> Vec<RatingRecord> {
        let mut entities: Vec<&EntityId> = self.ratings.keys().collect();
        entities.sort_unstable();

        let mut records = Vec::with_capacity(self.rating_count());
        for entity in entities {
            let row = &self.ratings[entity];
            let mut counterparts: Vec<(&EntityId, &f64)> = row.iter().collect();
            counterparts.sort_unstable_by_key(|(id, _)| **id);

            for (counterpart, rating) in counterparts {
                let (item_id, subject_id) = match self.orientation {
                    Orientation::BySubject => (*counterpart, *entity),
                    Orientation::ByItem => (*entity, *counterpart),
                };
                records.push(RatingRecord {
                    item_id,
                    subject_id,
                    rating: *rating,
                });
            }
        }
        records
    }
}
