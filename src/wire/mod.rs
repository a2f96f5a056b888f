//! Coordinator <-> Worker Wire Protocol
//!
//! Workers and the coordinator talk over plain TCP. Every logical message is one
//! `WireMessage` value, serialized with `bincode` and wrapped in a length-prefixed frame
//! so that message boundaries survive the byte stream.
//!
//! ## Conversations
//! - **Broadcast**: coordinator sends `Job`, worker answers `Recommendations`,
//!   coordinator closes with `Fin`.
//! - **Pull**: worker sends `Pull`, coordinator answers `Fragment` (worker replies
//!   `FragmentResult`) or `Fin` once the pool is drained.

pub mod codec;
pub mod types;
