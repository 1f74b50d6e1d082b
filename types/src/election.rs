//! Election identity and tally state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle for an election, assigned by the contract at creation time.
///
/// Ids are the contract's enumeration indices: stable for the process
/// lifetime and unique within a given ledger state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(u64);

impl ElectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ElectionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A votable contest tracked by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub name: String,
    /// Running local tally. Zeroed at bootstrap, then only ever increases.
    pub vote_count: u64,
}

impl Election {
    /// Create an election with a fresh zero tally.
    pub fn new(id: ElectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vote_count: 0,
        }
    }
}
