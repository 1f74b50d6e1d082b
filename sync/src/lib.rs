//! Election state-sync engine.
//!
//! Keeps an in-memory tally of on-chain elections synchronized with the
//! contract's ballot-cast event stream:
//! - Bootstrap drains the contract's enumeration into the election store
//! - A single event subscription folds incoming ballots into the tallies
//! - Re-bootstrapping releases the prior subscription before attaching a
//!   new one, so listeners never accumulate across re-initialization

pub mod engine;
pub mod error;
pub mod stats;
pub mod store;

pub use engine::{SyncEngine, SyncState};
pub use error::SyncError;
pub use stats::{StatsSnapshot, SyncStats};
pub use store::ElectionStore;
