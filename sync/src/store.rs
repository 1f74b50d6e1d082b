//! In-memory election store — the single local source of truth for tallies.

use std::collections::BTreeMap;

use tally_types::{Election, ElectionId};

use crate::SyncError;

/// Ordered mapping from election id to election state.
///
/// Keys are exactly the set of elections enumerated at the most recent
/// bootstrap. Mutated only by the sync engine; everything else sees cloned
/// snapshots.
#[derive(Debug, Default)]
pub struct ElectionStore {
    elections: BTreeMap<ElectionId, Election>,
}

impl ElectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mapping wholesale, zeroing every tally.
    ///
    /// Establishes a fresh baseline regardless of any externally reported
    /// vote counts. Must precede any increment.
    pub fn initialize(&mut self, elections: Vec<Election>) {
        self.elections = elections
            .into_iter()
            .map(|mut election| {
                election.vote_count = 0;
                (election.id, election)
            })
            .collect();
    }

    /// Increment one election's tally by a single vote.
    ///
    /// Fails with [`SyncError::UnknownElection`] when the id is outside the
    /// current enumeration — a consistency violation to surface, not to
    /// swallow.
    pub fn increment(&mut self, id: ElectionId) -> Result<(), SyncError> {
        match self.elections.get_mut(&id) {
            Some(election) => {
                election.vote_count += 1;
                Ok(())
            }
            None => Err(SyncError::UnknownElection(id)),
        }
    }

    /// Cloned, id-ordered view for rendering.
    pub fn snapshot(&self) -> Vec<Election> {
        self.elections.values().cloned().collect()
    }

    /// Read a single election by id.
    pub fn election(&self, id: ElectionId) -> Option<Election> {
        self.elections.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.elections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elections.is_empty()
    }
}
