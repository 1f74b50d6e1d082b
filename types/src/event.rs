//! Ballot-cast event payload with a validating JSON decoder.
//!
//! Events arrive from the gateway as loosely-typed JSON blobs. The decoder
//! maps malformed payloads to a [`PayloadError`] kind instead of panicking,
//! so a single bad event never takes down the sync loop.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{ElectionId, VoterAddress};

/// Decode failure for an incoming event payload.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` has the wrong type")]
    InvalidField(&'static str),
}

/// Event emitted by the ledger whenever a vote is recorded.
///
/// Carries the target election id plus the voter addresses and vote weights
/// of the cast ballot. Delivery is at-least-once in emission order; the
/// payload carries no dedup token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotCast {
    pub election_id: ElectionId,
    pub voters: Vec<VoterAddress>,
    pub weights: Vec<u64>,
}

impl BallotCast {
    /// Decode a loosely-typed event blob as delivered on the wire.
    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        let election_id = value
            .get("electionId")
            .ok_or(PayloadError::MissingField("electionId"))?
            .as_u64()
            .ok_or(PayloadError::InvalidField("electionId"))?;

        let voters = value
            .get("voters")
            .ok_or(PayloadError::MissingField("voters"))?
            .as_array()
            .ok_or(PayloadError::InvalidField("voters"))?
            .iter()
            .map(|v| {
                v.as_str()
                    .and_then(VoterAddress::parse)
                    .ok_or(PayloadError::InvalidField("voters"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let weights = value
            .get("weights")
            .ok_or(PayloadError::MissingField("weights"))?
            .as_array()
            .ok_or(PayloadError::InvalidField("weights"))?
            .iter()
            .map(|w| w.as_u64().ok_or(PayloadError::InvalidField("weights")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            election_id: ElectionId::new(election_id),
            voters,
            weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_well_formed_payload() {
        let value = json!({
            "electionId": 1,
            "voters": [
                "0x7F2FA234AEd9F7FA0D5070Fb325D1c2C983E96b1",
                "0x154e80Ebc2e4769A1B680CAC800eE3A2613dC8D6",
            ],
            "weights": [2, 3],
        });

        let event = BallotCast::from_json(&value).unwrap();
        assert_eq!(event.election_id, ElectionId::new(1));
        assert_eq!(event.voters.len(), 2);
        assert_eq!(event.weights, vec![2, 3]);
    }

    #[test]
    fn missing_election_id_is_rejected() {
        let value = json!({ "voters": [], "weights": [] });
        assert_eq!(
            BallotCast::from_json(&value),
            Err(PayloadError::MissingField("electionId"))
        );
    }

    #[test]
    fn non_numeric_election_id_is_rejected() {
        let value = json!({ "electionId": "one", "voters": [], "weights": [] });
        assert_eq!(
            BallotCast::from_json(&value),
            Err(PayloadError::InvalidField("electionId"))
        );
    }

    #[test]
    fn negative_election_id_is_rejected() {
        let value = json!({ "electionId": -4, "voters": [], "weights": [] });
        assert_eq!(
            BallotCast::from_json(&value),
            Err(PayloadError::InvalidField("electionId"))
        );
    }

    #[test]
    fn unprefixed_voter_is_rejected() {
        let value = json!({
            "electionId": 0,
            "voters": ["7F2FA234AEd9F7FA0D5070Fb325D1c2C983E96b1"],
            "weights": [1],
        });
        assert_eq!(
            BallotCast::from_json(&value),
            Err(PayloadError::InvalidField("voters"))
        );
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let event = BallotCast {
            election_id: ElectionId::new(2),
            voters: vec![VoterAddress::new("0x7F2FA234AEd9F7FA0D5070Fb325D1c2C983E96b1")],
            weights: vec![5],
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["electionId"], 2);
        assert!(value["voters"].is_array());
        assert!(value["weights"].is_array());
    }
}
