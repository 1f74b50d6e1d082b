use thiserror::Error;

use tally_types::ElectionId;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("gateway error: {0}")]
    Gateway(#[from] tally_gateway::GatewayError),

    /// An event referenced an election outside the current enumeration.
    #[error("unknown election {0}")]
    UnknownElection(ElectionId),
}
