//! Contract gateway abstraction and its JSON-RPC/WebSocket client.
//!
//! The sync engine never talks to the ledger directly; it consumes the
//! [`ContractGateway`] trait. Production code injects [`RpcGateway`], tests
//! inject the instrumented fake from `tally-nullables`.

pub mod error;
pub mod rpc;
pub mod subscription;

pub use error::GatewayError;
pub use rpc::RpcGateway;
pub use subscription::{BallotSubscription, ReleaseGuard, EVENT_CHANNEL_CAPACITY};

use async_trait::async_trait;
use serde::Deserialize;

use tally_types::{ElectionId, VoterAddress};

/// Election fields readable from the contract before any local state exists.
#[derive(Clone, Debug, Deserialize)]
pub struct ElectionMeta {
    pub name: String,
}

/// Handle for a submitted ballot awaiting confirmation on the ledger.
///
/// Submission is fire-and-forget from the engine's point of view: the local
/// tally updates only when the corresponding ballot-cast event arrives.
#[derive(Clone, Debug, Deserialize)]
pub struct PendingBallot {
    pub tx_hash: String,
}

/// Read/write/subscribe interface to the remote ledger's election contract.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Number of elections the contract currently tracks.
    async fn count_elections(&self) -> Result<u64, GatewayError>;

    /// Read one election's metadata by its enumeration index.
    async fn election_by_index(&self, index: u64) -> Result<ElectionMeta, GatewayError>;

    /// Attach to the ballot-cast event stream.
    ///
    /// Releasing the returned subscription (by dropping it) detaches from
    /// the stream; release is idempotent and never fails.
    async fn subscribe_ballot_cast(&self) -> Result<BallotSubscription, GatewayError>;

    /// Submit a ballot for `election_id`, returning as soon as the ledger
    /// accepts the submission for processing.
    async fn submit_ballot(
        &self,
        election_id: ElectionId,
        voters: &[VoterAddress],
        weights: &[u64],
    ) -> Result<PendingBallot, GatewayError>;
}
