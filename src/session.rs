//! Remote game session bound to one server-assigned agent.

use crate::dispatch::Dispatcher;
use crate::error::ExplorerResult;
use crate::handle::{AsyncMovementResult, Completer};
use crate::movement::{IntoMoveVector, MoveVector, MovementResult, normalize_move};
use crate::protocol::{Endpoint, MoveRequest, SessionState, decode_move_response};
use crate::tile::Tile;
use crate::transport::Transport;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a session, assigned by the server.
pub type SessionId = String;

/// A session controlling one agent on the game server.
///
/// Derived state (alive flag, last message, last discovered tile) always
/// reflects the most recently *completed* move. Background moves that are
/// in flight at the same time race on this state: whichever completes last
/// wins, regardless of issue order. Await each move before issuing the next
/// when ordering matters.
#[derive(Debug)]
pub struct RemoteGameSession {
    sid: SessionId,
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    state: Arc<Mutex<SessionState>>,
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decodes `payload` against the current state and installs the new state.
fn apply_response(state: &Mutex<SessionState>, payload: &Value) -> ExplorerResult<MovementResult> {
    let mut current = lock_state(state);
    let decoding = decode_move_response(payload, &current);
    *current = decoding.next_state;
    decoding.outcome
}

/// Records a background failure as the session's last message.
fn record_failure(state: &Mutex<SessionState>, message: &str) {
    let mut current = lock_state(state);
    *current = current.with_failure(message);
}

/// Completion of a background move. Runs exactly once per dispatched request.
///
/// The completer carries a hook that records failures on `state`, so the
/// error path only has to resolve it.
fn finish_background(
    sid: &str,
    state: &Mutex<SessionState>,
    completer: Completer,
    response: ExplorerResult<Value>,
) {
    let outcome = response.and_then(|payload| apply_response(state, &payload));
    match outcome {
        Ok(result) => {
            info!(
                sid,
                moved = result.moved_successfully(),
                alive = result.is_agent_alive(),
                "Background move completed"
            );
            completer.complete(result);
        }
        Err(err) => {
            let message = err.message().to_string();
            warn!(sid, error = %message, "Background move failed; reporting agent as dead");
            completer.fail(message);
        }
    }
}

impl RemoteGameSession {
    /// Binds a session to `sid`, using `transport` for every move.
    ///
    /// Normally built by [`RemoteGameSessionFactory`](crate::RemoteGameSessionFactory).
    #[instrument(skip(transport, dispatcher), fields(sid = %sid))]
    pub fn new(sid: SessionId, transport: Arc<dyn Transport>, dispatcher: Dispatcher) -> Self {
        info!("Creating remote game session");
        Self {
            sid,
            transport,
            dispatcher,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Server-assigned session id.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Snapshot of the derived state.
    pub fn state(&self) -> SessionState {
        lock_state(&self.state).clone()
    }

    /// Whether the agent survived the last completed move. True before any move.
    pub fn is_agent_alive(&self) -> bool {
        lock_state(&self.state).agent_alive()
    }

    /// Server message from the last completed move, or the last background failure.
    pub fn last_message(&self) -> Option<String> {
        lock_state(&self.state).last_message().map(str::to_string)
    }

    /// Tile discovered by the last completed move.
    pub fn discovered_tile(&self) -> Option<Tile> {
        lock_state(&self.state).last_discovered_tile()
    }

    /// Strategy used for background moves.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn request_body(&self, vector: MoveVector) -> ExplorerResult<Value> {
        Ok(serde_json::to_value(MoveRequest::new(&self.sid, vector))?)
    }

    /// Moves the agent by `(dx, dy)`, blocking until the server answers.
    ///
    /// Transport failures propagate without touching session state. Inside
    /// an async runtime the HTTP transport refuses to block and returns a
    /// transport error; use [`move_agent_async`](Self::move_agent_async) there.
    #[instrument(skip(self, vector), fields(sid = %self.sid))]
    pub fn move_agent(&self, vector: impl IntoMoveVector) -> ExplorerResult<MovementResult> {
        let vector = normalize_move(vector)?;
        debug!(dx = vector.dx, dy = vector.dy, "Sending move");
        let body = self.request_body(vector)?;
        let payload = self.transport.post_blocking(Endpoint::Move, &body)?;
        let result = apply_response(&self.state, &payload)?;
        info!(
            moved = result.moved_successfully(),
            alive = result.is_agent_alive(),
            "Move completed"
        );
        Ok(result)
    }

    /// Async counterpart of [`move_agent`](Self::move_agent) for Tokio callers.
    ///
    /// Same error policy: transport failures propagate without touching state.
    #[instrument(skip(self, vector), fields(sid = %self.sid))]
    pub async fn move_agent_async(&self, vector: impl IntoMoveVector) -> ExplorerResult<MovementResult> {
        let vector = normalize_move(vector)?;
        debug!(dx = vector.dx, dy = vector.dy, "Sending move");
        let body = self.request_body(vector)?;
        let payload = self.transport.post(Endpoint::Move, &body).await?;
        let result = apply_response(&self.state, &payload)?;
        info!(
            moved = result.moved_successfully(),
            alive = result.is_agent_alive(),
            "Move completed"
        );
        Ok(result)
    }

    /// Starts a move in the background and returns a handle immediately.
    ///
    /// Validation errors are returned before anything is dispatched. Once
    /// dispatched, the handle always resolves: a transport or decoding
    /// failure records its text as the last message and resolves with a
    /// dead, unmoved result (see [`AsyncMovementResult::transport_failure`]).
    #[instrument(skip(self, vector), fields(sid = %self.sid))]
    pub fn move_async(&self, vector: impl IntoMoveVector) -> ExplorerResult<AsyncMovementResult> {
        let vector = normalize_move(vector)?;
        let body = self.request_body(vector)?;
        let (handle, completer) = AsyncMovementResult::pending();
        let failure_state = Arc::clone(&self.state);
        let completer = completer.on_failure(move |message| record_failure(&failure_state, message));

        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let sid = self.sid.clone();

        match &self.dispatcher {
            Dispatcher::Runtime(runtime) => {
                debug!(dx = vector.dx, dy = vector.dy, "Dispatching move as task");
                runtime.spawn(async move {
                    let response = transport.post(Endpoint::Move, &body).await;
                    finish_background(&sid, &state, completer, response);
                });
            }
            Dispatcher::Thread => {
                debug!(dx = vector.dx, dy = vector.dy, "Dispatching move on worker thread");
                let spawned = std::thread::Builder::new()
                    .name(format!("explorer-move-{}", self.sid))
                    .spawn(move || {
                        let response = transport.post_blocking(Endpoint::Move, &body);
                        finish_background(&sid, &state, completer, response);
                    });
                if let Err(e) = spawned {
                    // The unrun closure drops its completer, which resolves the handle
                    // and records the failure.
                    warn!(error = %e, "Failed to spawn move thread");
                }
            }
        }

        Ok(handle)
    }
}
