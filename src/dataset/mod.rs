//! Dataset Module
//!
//! Loads the ratings CSV into memory once per process.
//!
//! ## Workflow
//! 1. **Read**: The file is streamed line by line; the header row is discarded.
//! 2. **Parse**: Each row yields `item_id, subject_id, rating`. Rows that do not parse
//!    are counted and dropped instead of failing the load.
//! 3. **Build**: Records are folded into a sparse `RatingMatrix` in the requested orientation.
//!
//! After loading, the matrix is wrapped in an `Arc` and never mutated again, so every
//! dispatch task and scoring call reads it without locking.

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;
