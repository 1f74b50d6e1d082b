//! Sync engine — bootstraps the election store and folds ballot events.
//!
//! The engine is a state machine: `Idle → Bootstrapping → Live →
//! (Bootstrapping | Teardown)`. Bootstrap enumerates every election through
//! the gateway and commits the result all-or-nothing, then attaches exactly
//! one ballot-cast subscription whose fold task is the store's only writer
//! while Live. Re-bootstrapping releases the prior subscription before
//! attaching the next one, which is what keeps duplicate listeners (and
//! double counting) impossible across re-initialization.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tally_gateway::{BallotSubscription, ContractGateway, PendingBallot};
use tally_types::{BallotCast, Election, ElectionId, VoterAddress};

use crate::stats::{StatsSnapshot, SyncStats};
use crate::store::ElectionStore;
use crate::SyncError;

/// Lifecycle state of the sync engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// No bootstrap has run yet (or the engine was shut down).
    Idle,
    /// Enumeration in progress; nothing committed yet.
    Bootstrapping,
    /// Bootstrapped, with one live subscription folding events.
    Live,
    /// The last bootstrap attempt aborted without committing anything.
    BootstrapFailed,
}

/// Owner of the single live ballot-cast subscription.
///
/// The normal release path signals the fold task to stop and waits for it,
/// so the gateway-side attachment is provably gone when `release` returns.
/// `Drop` aborts the task instead — the guaranteed-release backstop when the
/// engine itself is dropped while Live.
struct SubscriptionHandle {
    stop: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    async fn release(mut self) {
        // The task may already have exited if the stream closed on its own.
        let _ = self.stop.send(());
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Orchestrates bootstrap and event folding for a single election contract.
///
/// Generic over the gateway so tests can inject an instrumented fake.
pub struct SyncEngine<G: ContractGateway> {
    gateway: Arc<G>,
    store: Arc<Mutex<ElectionStore>>,
    stats: Arc<SyncStats>,
    state: SyncState,
    subscription: Option<SubscriptionHandle>,
}

impl<G: ContractGateway + 'static> SyncEngine<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            store: Arc::new(Mutex::new(ElectionStore::new())),
            stats: Arc::new(SyncStats::new()),
            state: SyncState::Idle,
            subscription: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Enumerate all elections and (re)attach the single event subscription.
    ///
    /// All-or-nothing: a failed fetch leaves the store and any prior
    /// subscription exactly as they were, and the engine reports
    /// [`SyncState::BootstrapFailed`]. Retrying is the caller's decision.
    pub async fn bootstrap(&mut self) -> Result<(), SyncError> {
        self.state = SyncState::Bootstrapping;

        let elections = match self.enumerate().await {
            Ok(elections) => elections,
            Err(e) => {
                self.stats.record_bootstrap_failure();
                self.state = SyncState::BootstrapFailed;
                return Err(e);
            }
        };
        let count = elections.len();

        self.store.lock().await.initialize(elections);

        // Release before attach: at most one live subscription, ever.
        if let Some(handle) = self.subscription.take() {
            handle.release().await;
        }

        let subscription = match self.gateway.subscribe_ballot_cast().await {
            Ok(subscription) => subscription,
            Err(e) => {
                self.stats.record_bootstrap_failure();
                self.state = SyncState::BootstrapFailed;
                return Err(e.into());
            }
        };
        self.subscription = Some(self.spawn_fold_task(subscription));

        self.stats.record_bootstrap();
        self.state = SyncState::Live;
        info!(elections = count, "bootstrap complete, folding ballot events");
        Ok(())
    }

    /// Fetch the count, then each election in index order.
    async fn enumerate(&self) -> Result<Vec<Election>, SyncError> {
        let count = self.gateway.count_elections().await?;
        let mut elections = Vec::with_capacity(count as usize);
        for index in 0..count {
            let meta = self.gateway.election_by_index(index).await?;
            elections.push(Election::new(ElectionId::new(index), meta.name));
        }
        Ok(elections)
    }

    fn spawn_fold_task(&self, mut subscription: BallotSubscription) -> SubscriptionHandle {
        let (stop, mut stop_rx) = broadcast::channel(1);
        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    event = subscription.recv() => match event {
                        Some(event) => fold_event(&store, &stats, event).await,
                        None => {
                            debug!("ballot event stream closed by gateway");
                            break;
                        }
                    },
                }
            }
        });

        SubscriptionHandle {
            stop,
            task: Some(task),
        }
    }

    /// Read-only copy of the current tallies, in id order.
    pub async fn snapshot(&self) -> Vec<Election> {
        self.store.lock().await.snapshot()
    }

    /// Single-election read backing the "view election" intent.
    pub async fn view_election(&self, id: ElectionId) -> Option<Election> {
        self.store.lock().await.election(id)
    }

    /// Forward a ballot to the contract's write path.
    ///
    /// Returns as soon as the gateway accepts the submission. The local
    /// tally is not touched: it updates only when the corresponding
    /// ballot-cast event folds in, so the event stream stays the single
    /// source of truth and nothing is counted twice.
    pub async fn cast_ballot(
        &self,
        election_id: ElectionId,
        voters: &[VoterAddress],
        weights: &[u64],
    ) -> Result<PendingBallot, SyncError> {
        let pending = self
            .gateway
            .submit_ballot(election_id, voters, weights)
            .await?;
        debug!(%election_id, tx_hash = %pending.tx_hash, "ballot submitted");
        Ok(pending)
    }

    /// Release the subscription and return to `Idle`. Idempotent.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.subscription.take() {
            handle.release().await;
        }
        self.state = SyncState::Idle;
    }

    /// Activity counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Fold one ballot-cast event into the store.
///
/// An unknown election id is an anomaly: logged, counted, and discarded so
/// a single bad event never takes down the sync loop.
async fn fold_event(store: &Mutex<ElectionStore>, stats: &SyncStats, event: BallotCast) {
    let mut store = store.lock().await;
    match store.increment(event.election_id) {
        Ok(()) => stats.record_event(),
        Err(e) => {
            stats.record_anomaly();
            warn!("discarding ballot event: {e}");
        }
    }
}
