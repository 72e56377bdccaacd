//! Wire protocol: request bodies, response decoding and derived session state.
//!
//! Decoding is pure. Both the blocking and background move paths call
//! [`decode_move_response`] and then apply the returned state in one step.

use crate::error::{ExplorerError, ExplorerResult};
use crate::identifier::VisualPayload;
use crate::movement::{MoveVector, MovementResult};
use crate::tile::Tile;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Server endpoints used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Session handshake.
    Connect,
    /// Relative move of the session's agent.
    Move,
}

impl Endpoint {
    /// Path appended to the base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Connect => "/connect",
            Endpoint::Move => "/move",
        }
    }
}

/// Body of `POST /connect`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConnectRequest<'a> {
    pub(crate) vsid: Option<VisualPayload>,
    pub(crate) username: &'a str,
}

/// Body of `POST /move`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MoveRequest<'a> {
    pub(crate) sid: &'a str,
    pub(crate) dx: i64,
    pub(crate) dy: i64,
}

impl<'a> MoveRequest<'a> {
    pub(crate) fn new(sid: &'a str, vector: MoveVector) -> Self {
        Self {
            sid,
            dx: vector.dx,
            dy: vector.dy,
        }
    }
}

/// Reads a response flag leniently: any JSON value is accepted and judged by
/// truthiness (non-zero numbers, non-empty strings and collections are true).
/// `null` counts as absent.
fn truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::Null => None,
        Value::Bool(flag) => Some(flag),
        Value::Number(n) => Some(n.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(text) => Some(!text.is_empty()),
        Value::Array(items) => Some(!items.is_empty()),
        Value::Object(fields) => Some(!fields.is_empty()),
    }))
}

/// Response of `POST /connect`.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConnectResponse {
    #[serde(default, deserialize_with = "truthy")]
    success: Option<bool>,
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Response of `POST /move`.
///
/// `discovered` stays raw so a malformed tile does not hide the rest of the payload.
#[derive(Debug, Clone, Default, Deserialize)]
struct MoveResponse {
    #[serde(default, deserialize_with = "truthy")]
    success: Option<bool>,
    #[serde(default, deserialize_with = "truthy")]
    moved: Option<bool>,
    #[serde(default, deserialize_with = "truthy")]
    alive: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    discovered: Option<Value>,
}

/// Derived per-session state, reflecting the most recently completed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    agent_alive: bool,
    last_message: Option<String>,
    last_discovered_tile: Option<Tile>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            agent_alive: true,
            last_message: None,
            last_discovered_tile: None,
        }
    }
}

impl SessionState {
    /// Whether the agent is believed alive.
    pub fn agent_alive(&self) -> bool {
        self.agent_alive
    }

    /// Message from the last response, or the last swallowed failure.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Tile discovered by the last move.
    pub fn last_discovered_tile(&self) -> Option<Tile> {
        self.last_discovered_tile
    }

    /// State after a background move failed before it could be decoded.
    ///
    /// Only the message changes; alive flag and tile keep their values.
    pub fn with_failure(&self, message: impl Into<String>) -> Self {
        Self {
            last_message: Some(message.into()),
            ..self.clone()
        }
    }
}

/// Outcome of decoding one move response.
#[derive(Debug, Clone)]
pub struct MoveDecoding {
    /// State to install on the session, whatever the outcome.
    pub next_state: SessionState,
    /// Movement result, or the protocol error hit while decoding.
    pub outcome: ExplorerResult<MovementResult>,
}

/// Decodes a `/move` response against the current session state.
///
/// The message is always taken from the payload and the tile is always
/// replaced (cleared when absent or invalid). A missing or false `success`
/// means the agent is treated as dead; otherwise `moved` and `alive`
/// default to false.
#[instrument(skip(payload, current))]
pub fn decode_move_response(payload: &Value, current: &SessionState) -> MoveDecoding {
    let response: MoveResponse = match serde_json::from_value(payload.clone()) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Move response has unexpected shape");
            return MoveDecoding {
                next_state: SessionState {
                    last_message: None,
                    last_discovered_tile: None,
                    ..current.clone()
                },
                outcome: Err(ExplorerError::protocol(format!("Invalid move response: {}", e))),
            };
        }
    };

    let last_message = response.message;
    let tile = match Tile::from_json(response.discovered.as_ref()) {
        Ok(tile) => tile,
        Err(e) => {
            return MoveDecoding {
                next_state: SessionState {
                    agent_alive: current.agent_alive,
                    last_message,
                    last_discovered_tile: None,
                },
                outcome: Err(e),
            };
        }
    };

    if !response.success.unwrap_or(false) {
        debug!(message = ?last_message, "Move was not accepted; agent presumed dead");
        return MoveDecoding {
            next_state: SessionState {
                agent_alive: false,
                last_message,
                last_discovered_tile: tile,
            },
            outcome: Ok(MovementResult::new(false, false, tile)),
        };
    }

    let moved = response.moved.unwrap_or(false);
    let alive = response.alive.unwrap_or(false);
    debug!(moved, alive, tile = ?tile, "Decoded move response");
    MoveDecoding {
        next_state: SessionState {
            agent_alive: alive,
            last_message,
            last_discovered_tile: tile,
        },
        outcome: Ok(MovementResult::new(moved, alive, tile)),
    }
}

/// Extracts the session id from a `/connect` response.
#[instrument(skip(payload))]
pub fn decode_connect_response(payload: &Value) -> ExplorerResult<String> {
    let response: ConnectResponse = serde_json::from_value(payload.clone())
        .map_err(|e| ExplorerError::protocol(format!("Invalid connect response: {}", e)))?;

    if !response.success.unwrap_or(false) {
        let message = response
            .message
            .unwrap_or_else(|| "Unknown error during session creation.".to_string());
        return Err(ExplorerError::connect_rejected(message));
    }

    match response.sid {
        Some(sid) if !sid.is_empty() => Ok(sid),
        _ => Err(ExplorerError::protocol(
            "Invalid response from server: missing 'sid'.",
        )),
    }
}
