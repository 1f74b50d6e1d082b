//! Nullable infrastructure for deterministic testing.
//!
//! Fakes that stand in for real collaborators while recording everything
//! that happened, so tests can make exact assertions without a live ledger.

pub mod gateway;

pub use gateway::{NullGateway, SubmittedBallot};
