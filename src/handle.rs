//! Single-assignment handle for a move running in the background.

use crate::movement::MovementResult;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// How a background move ended.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolution {
    result: MovementResult,
    transport_failure: Option<String>,
}

#[derive(Debug, Default)]
struct Slot {
    resolved: Mutex<Option<Resolution>>,
    signal: Condvar,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Option<Resolution>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`RemoteGameSession::move_async`](crate::RemoteGameSession::move_async).
///
/// Starts pending and is resolved exactly once by the request's completion.
/// Readiness and the result become visible together, so a caller that sees
/// [`is_ready`](Self::is_ready) return true always reads the final result.
/// Dropping the handle does not cancel the request.
#[derive(Debug, Clone)]
pub struct AsyncMovementResult {
    slot: Arc<Slot>,
}

impl AsyncMovementResult {
    pub(crate) fn pending() -> (Self, Completer) {
        let slot = Arc::new(Slot::default());
        (
            Self {
                slot: Arc::clone(&slot),
            },
            Completer {
                slot: Some(slot),
                on_failure: None,
            },
        )
    }

    /// True once the move has completed, successfully or not.
    pub fn is_ready(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// The result, if the move has completed.
    pub fn result(&self) -> Option<MovementResult> {
        self.slot.lock().as_ref().map(|r| r.result)
    }

    /// Failure text when the result was synthesized because the request
    /// could not be completed or decoded.
    ///
    /// Distinguishes "we could not tell" from a reported death, which both
    /// carry `agent_alive == false`.
    pub fn transport_failure(&self) -> Option<String> {
        self.slot
            .lock()
            .as_ref()
            .and_then(|r| r.transport_failure.clone())
    }

    /// Blocks until the move completes or `timeout` elapses.
    ///
    /// Returns `None` on timeout; the request keeps running. `None` as the
    /// timeout waits indefinitely. Once resolved, every call returns the same result.
    #[instrument(skip(self))]
    pub fn wait(&self, timeout: Option<Duration>) -> Option<MovementResult> {
        let guard = self.slot.lock();
        let guard = match timeout {
            Some(timeout) => {
                let (guard, waited) = self
                    .slot
                    .signal
                    .wait_timeout_while(guard, timeout, |r| r.is_none())
                    .unwrap_or_else(PoisonError::into_inner);
                if waited.timed_out() && guard.is_none() {
                    debug!("Timed out waiting for move");
                }
                guard
            }
            None => self
                .slot
                .signal
                .wait_while(guard, |r| r.is_none())
                .unwrap_or_else(PoisonError::into_inner),
        };
        guard.as_ref().map(|r| r.result)
    }
}

/// Text recorded when the background unit is torn down before resolving.
pub(crate) const ABANDONED_MOVE: &str = "background move ended without a result";

type FailureHook = Box<dyn FnOnce(&str) + Send>;

/// Write side of an [`AsyncMovementResult`], owned by the in-flight request.
///
/// Dropping it unresolved (the task panicked, was torn down, or never ran)
/// resolves the handle as a failure so waiters never hang. The failure hook
/// runs before the handle becomes ready, on both paths, with the same text
/// the handle reports.
pub(crate) struct Completer {
    slot: Option<Arc<Slot>>,
    on_failure: Option<FailureHook>,
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("resolved", &self.slot.is_none())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

impl Completer {
    /// Installs a callback that observes the failure text before the handle resolves.
    pub(crate) fn on_failure(mut self, hook: impl FnOnce(&str) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(hook));
        self
    }

    /// Resolves with a decoded result.
    pub(crate) fn complete(mut self, result: MovementResult) {
        self.on_failure = None;
        self.resolve(Resolution {
            result,
            transport_failure: None,
        });
    }

    /// Resolves with a dead, unmoved result and the failure text.
    pub(crate) fn fail(mut self, message: String) {
        self.resolve_failed(message);
    }

    fn resolve_failed(&mut self, message: String) {
        if let Some(hook) = self.on_failure.take() {
            hook(&message);
        }
        self.resolve(Resolution {
            result: MovementResult::failed(),
            transport_failure: Some(message),
        });
    }

    fn resolve(&mut self, resolution: Resolution) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        let mut resolved = slot.lock();
        if resolved.is_none() {
            *resolved = Some(resolution);
            slot.signal.notify_all();
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        if self.slot.is_some() {
            warn!("Background move ended without a result");
            self.resolve_failed(ABANDONED_MOVE.to_string());
        }
    }
}
