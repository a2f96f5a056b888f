//! Scoring Module
//!
//! The pure, stateless math the workers run. Nothing here performs I/O or holds state
//! between calls, so strategies are shared freely behind `Arc<dyn ScoringStrategy>`.
//!
//! ## Submodules
//! - **`similarity`**: cosine similarity variants over sparse rating vectors, plus the
//!   mean-rating aggregate fragment workers compute.
//! - **`engine`**: the `ScoringStrategy` trait, the item-cosine and user-neighbour
//!   strategies, and the shared deterministic ranking helper.

pub mod engine;
pub mod similarity;

#[cfg(test)]
mod tests;
