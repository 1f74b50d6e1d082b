//! JSON-RPC + WebSocket gateway client.
//!
//! Reads and ballot submission go over HTTP JSON-RPC (`election_count`,
//! `election_info`, `cast_ballot` actions against the contract node). The
//! ballot-cast event stream is a WebSocket subscription: a reader task pumps
//! decoded events into the subscription channel until it is released.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use tally_types::{BallotCast, ElectionId, VoterAddress};

use crate::subscription::{BallotSubscription, ReleaseGuard, EVENT_CHANNEL_CAPACITY};
use crate::{ContractGateway, ElectionMeta, GatewayError, PendingBallot};

/// Event topic carrying ballot-cast notifications.
const BALLOT_TOPIC: &str = "ballot_cast";

/// Gateway client for a contract node exposing JSON-RPC reads and a
/// WebSocket event feed.
#[derive(Clone)]
pub struct RpcGateway {
    http: reqwest::Client,
    rpc_url: String,
    ws_url: String,
}

impl RpcGateway {
    /// Create a gateway targeting the given JSON-RPC and WebSocket endpoints
    /// (e.g. `http://127.0.0.1:9545` and `ws://127.0.0.1:9546/ws`).
    pub fn new(
        rpc_url: impl Into<String>,
        ws_url: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            ws_url: ws_url.into(),
        })
    }

    /// The configured JSON-RPC endpoint.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// The configured WebSocket endpoint.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(&self, action: &str, params: Value) -> Result<Value, GatewayError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| GatewayError::Decode("params must be a JSON object".into()))?
            .insert("action".to_string(), serde_json::json!(action));

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::Unavailable(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error") {
            return Err(map_error_body(err));
        }

        Ok(json.get("result").cloned().unwrap_or(json))
    }
}

#[async_trait::async_trait]
impl ContractGateway for RpcGateway {
    async fn count_elections(&self) -> Result<u64, GatewayError> {
        let result = self.rpc_call("election_count", serde_json::json!({})).await?;
        let resp: ElectionCountResult = serde_json::from_value(result)
            .map_err(|e| GatewayError::Decode(format!("invalid election_count response: {e}")))?;
        Ok(resp.count)
    }

    async fn election_by_index(&self, index: u64) -> Result<ElectionMeta, GatewayError> {
        let result = self
            .rpc_call("election_info", serde_json::json!({ "index": index }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| GatewayError::Decode(format!("invalid election_info response: {e}")))
    }

    async fn subscribe_ballot_cast(&self) -> Result<BallotSubscription, GatewayError> {
        let (mut ws, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| GatewayError::Unavailable(format!("websocket connect failed: {e}")))?;

        let subscribe = serde_json::json!({ "action": "subscribe", "topic": BALLOT_TOPIC });
        ws.send(Message::Text(subscribe.to_string()))
            .await
            .map_err(|e| GatewayError::Unavailable(format!("subscribe failed: {e}")))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let reader = tokio::spawn(async move {
            while let Some(frame) = ws.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if let Some(event) = decode_event_frame(&text) {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("gateway closed the event stream");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("event stream error: {e}");
                        break;
                    }
                }
            }
        });

        let guard = ReleaseGuard::new(move || reader.abort());
        Ok(BallotSubscription::new(rx, guard))
    }

    async fn submit_ballot(
        &self,
        election_id: ElectionId,
        voters: &[VoterAddress],
        weights: &[u64],
    ) -> Result<PendingBallot, GatewayError> {
        let result = self
            .rpc_call(
                "cast_ballot",
                serde_json::json!({
                    "election_id": election_id.as_u64(),
                    "voters": voters.iter().map(VoterAddress::as_str).collect::<Vec<_>>(),
                    "weights": weights,
                }),
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|e| GatewayError::Decode(format!("invalid cast_ballot response: {e}")))
    }
}

/// Response from the `election_count` RPC.
#[derive(Debug, Deserialize)]
struct ElectionCountResult {
    count: u64,
}

/// Map a JSON-RPC error body to the gateway error taxonomy.
fn map_error_body(err: &Value) -> GatewayError {
    let code = err.get("code").and_then(Value::as_str).unwrap_or("");
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    match code {
        "index_out_of_range" => GatewayError::IndexOutOfRange {
            index: err.get("index").and_then(Value::as_u64).unwrap_or(0),
        },
        "rejected" => GatewayError::RejectedByLedger(message),
        _ => GatewayError::Unavailable(message),
    }
}

/// Decode one WebSocket text frame into a ballot event.
///
/// Frames with other topics (acks, pongs) are skipped; malformed ballot
/// payloads are logged and dropped rather than crashing the reader.
fn decode_event_frame(text: &str) -> Option<BallotCast> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("unparseable event frame: {e}");
            return None;
        }
    };

    if value.get("topic").and_then(Value::as_str) != Some(BALLOT_TOPIC) {
        return None;
    }

    let data = value.get("data")?;
    match BallotCast::from_json(data) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("malformed ballot event discarded: {e}");
            None
        }
    }
}
