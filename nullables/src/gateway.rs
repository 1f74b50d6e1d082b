//! Nullable contract gateway — scripted elections, manual event emission,
//! and subscribe/release accounting.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use tally_gateway::{
    BallotSubscription, ContractGateway, ElectionMeta, GatewayError, PendingBallot, ReleaseGuard,
    EVENT_CHANNEL_CAPACITY,
};
use tally_types::{BallotCast, ElectionId, VoterAddress};

/// A ballot recorded by the fake's write path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedBallot {
    pub election_id: ElectionId,
    pub voters: Vec<VoterAddress>,
    pub weights: Vec<u64>,
}

/// A test gateway backed by scripted data.
///
/// Events are delivered only when a test calls [`emit`](Self::emit);
/// failures are injected per call site. Subscribe and release calls are
/// counted so tests can assert the single-subscription invariant.
pub struct NullGateway {
    elections: Mutex<Vec<String>>,
    unavailable: AtomicBool,
    fail_at_index: Mutex<Option<u64>>,
    senders: Mutex<Vec<mpsc::Sender<BallotCast>>>,
    subscribes: AtomicUsize,
    unsubscribes: Arc<AtomicUsize>,
    submitted: Mutex<Vec<SubmittedBallot>>,
    reject_submissions: AtomicBool,
    next_tx: AtomicU64,
}

impl NullGateway {
    pub fn new() -> Self {
        Self {
            elections: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            fail_at_index: Mutex::new(None),
            senders: Mutex::new(Vec::new()),
            subscribes: AtomicUsize::new(0),
            unsubscribes: Arc::new(AtomicUsize::new(0)),
            submitted: Mutex::new(Vec::new()),
            reject_submissions: AtomicBool::new(false),
            next_tx: AtomicU64::new(1),
        }
    }

    /// A gateway scripted with the given election names, in index order.
    pub fn with_elections(names: &[&str]) -> Self {
        let gateway = Self::new();
        gateway.set_elections(names);
        gateway
    }

    /// Replace the scripted election list.
    pub fn set_elections(&self, names: &[&str]) {
        *self.elections.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }

    /// Make the read of index `index` fail with `IndexOutOfRange`.
    pub fn fail_election_at(&self, index: u64) {
        *self.fail_at_index.lock().unwrap() = Some(index);
    }

    /// Toggle the dependency-down failure mode for every call.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make subsequent submissions fail with `RejectedByLedger`.
    pub fn set_reject_submissions(&self, reject: bool) {
        self.reject_submissions.store(reject, Ordering::SeqCst);
    }

    /// Deliver an event to every live subscription.
    pub async fn emit(&self, event: BallotCast) {
        let senders: Vec<mpsc::Sender<BallotCast>> = {
            let mut senders = self.senders.lock().unwrap();
            senders.retain(|s| !s.is_closed());
            senders.clone()
        };
        for sender in senders {
            let _ = sender.send(event.clone()).await;
        }
    }

    /// Total `subscribe` calls made against this gateway.
    pub fn subscribe_count(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    /// Total subscriptions released so far.
    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    /// Attachments that are live right now.
    pub fn active_subscriptions(&self) -> usize {
        self.subscribe_count() - self.unsubscribe_count()
    }

    /// All ballots recorded by the write path (for assertions).
    pub fn submitted(&self) -> Vec<SubmittedBallot> {
        self.submitted.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(GatewayError::Unavailable("scripted outage".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for NullGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractGateway for NullGateway {
    async fn count_elections(&self) -> Result<u64, GatewayError> {
        self.check_available()?;
        Ok(self.elections.lock().unwrap().len() as u64)
    }

    async fn election_by_index(&self, index: u64) -> Result<ElectionMeta, GatewayError> {
        self.check_available()?;
        if *self.fail_at_index.lock().unwrap() == Some(index) {
            return Err(GatewayError::IndexOutOfRange { index });
        }
        self.elections
            .lock()
            .unwrap()
            .get(index as usize)
            .map(|name| ElectionMeta { name: name.clone() })
            .ok_or(GatewayError::IndexOutOfRange { index })
    }

    async fn subscribe_ballot_cast(&self) -> Result<BallotSubscription, GatewayError> {
        self.check_available()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.senders.lock().unwrap().push(tx);
        self.subscribes.fetch_add(1, Ordering::SeqCst);

        let unsubscribes = Arc::clone(&self.unsubscribes);
        let guard = ReleaseGuard::new(move || {
            unsubscribes.fetch_add(1, Ordering::SeqCst);
        });
        Ok(BallotSubscription::new(rx, guard))
    }

    async fn submit_ballot(
        &self,
        election_id: ElectionId,
        voters: &[VoterAddress],
        weights: &[u64],
    ) -> Result<PendingBallot, GatewayError> {
        self.check_available()?;
        if self.reject_submissions.load(Ordering::SeqCst) {
            return Err(GatewayError::RejectedByLedger("scripted rejection".into()));
        }

        self.submitted.lock().unwrap().push(SubmittedBallot {
            election_id,
            voters: voters.to_vec(),
            weights: weights.to_vec(),
        });

        let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
        Ok(PendingBallot {
            tx_hash: format!("0x{n:064x}"),
        })
    }
}
