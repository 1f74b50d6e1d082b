use thiserror::Error;

use tally_types::PayloadError;

/// Failures surfaced by a [`crate::ContractGateway`] implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The dependency is not ready, or the connection to it dropped.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// An enumeration read referenced an index outside the contract's range.
    #[error("election index {index} out of range")]
    IndexOutOfRange { index: u64 },

    /// The ledger rejected a submitted ballot.
    #[error("ballot rejected by ledger: {0}")]
    RejectedByLedger(String),

    /// An event or response payload could not be decoded.
    #[error("malformed payload: {0}")]
    Decode(String),
}

impl From<PayloadError> for GatewayError {
    fn from(e: PayloadError) -> Self {
        GatewayError::Decode(e.to_string())
    }
}
