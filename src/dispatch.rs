//! Where background moves run.

use tracing::{debug, instrument};

/// Concurrency strategy for background moves, chosen once per session.
#[derive(Debug, Clone)]
pub enum Dispatcher {
    /// Spawn the request as a task on this Tokio runtime.
    Runtime(tokio::runtime::Handle),
    /// Run the blocking request on a dedicated worker thread.
    Thread,
}

impl Dispatcher {
    /// Uses the current Tokio runtime if there is one, worker threads otherwise.
    #[instrument]
    pub fn detect() -> Self {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Tokio runtime found; background moves will run as tasks");
                Dispatcher::Runtime(handle)
            }
            Err(_) => {
                debug!("No Tokio runtime; background moves will run on threads");
                Dispatcher::Thread
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::detect()
    }
}
