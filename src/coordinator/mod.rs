//! Job Coordinator Module
//!
//! Accepts recommendation requests, fans them out to the worker roster and merges the
//! answers. Also drives pull-mode runs, where workers fetch fragments of the rating data.
//!
//! ## Core Components
//! - **`service`**: the `Coordinator` itself and the bounded `JobIntake` in front of it.
//! - **`dispatcher`**: broadcast mode, one concurrent unit of work per roster worker.
//! - **`pull`**: pull mode, a listener that leases fragments from a `WorkPool`.
//! - **`queue`**: the `WorkPool` and the per-job `AssignmentSet`.
//! - **`barrier`** / **`tally`**: completion tracking and vote merging.
//! - **`handlers`**: the HTTP API.

pub mod barrier;
pub mod dispatcher;
pub mod handlers;
pub mod protocol;
pub mod pull;
pub mod queue;
pub mod service;
pub mod tally;
pub mod types;
