//! Fundamental types for the tally election sync.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: election identity and tally state, voter addresses, and the
//! ballot-cast event payload with its validating decoder.

pub mod address;
pub mod election;
pub mod event;

pub use address::VoterAddress;
pub use election::{Election, ElectionId};
pub use event::{BallotCast, PayloadError};
