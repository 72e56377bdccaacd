//! Error types for the remote explorer client.

use derive_more::{Display, Error};
use tracing::{error, instrument, warn};

/// Category of a client failure.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ExplorerErrorKind {
    /// Caller supplied malformed input (move vector arity, label length).
    #[display("Validation error: {}", _0)]
    Validation(String),

    /// Network failure, timeout or non-success HTTP status.
    #[display("Transport error: {}", _0)]
    Transport(String),

    /// The connect handshake answered `success: false`.
    #[display("Connect rejected: {}", _0)]
    ConnectRejected(String),

    /// The server answered with a payload the client cannot interpret.
    #[display("Protocol error: {}", _0)]
    Protocol(String),
}

/// Client error with caller location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("{} at {}:{}", kind, file, line)]
pub struct ExplorerError {
    /// What went wrong.
    pub kind: ExplorerErrorKind,
    /// Line number where the error was raised.
    pub line: u32,
    /// Source file where the error was raised.
    pub file: &'static str,
}

impl ExplorerError {
    /// Creates a new error with caller location tracking.
    #[track_caller]
    #[instrument(skip(kind))]
    pub fn new(kind: ExplorerErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        match &kind {
            ExplorerErrorKind::Validation(_) => warn!(error = %kind, "Explorer error created"),
            _ => error!(error = %kind, "Explorer error created"),
        }
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for a validation error.
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ExplorerErrorKind::Validation(message.into()))
    }

    /// Shorthand for a transport error.
    #[track_caller]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ExplorerErrorKind::Transport(message.into()))
    }

    /// Shorthand for a rejected connect handshake.
    #[track_caller]
    pub fn connect_rejected(message: impl Into<String>) -> Self {
        Self::new(ExplorerErrorKind::ConnectRejected(message.into()))
    }

    /// Shorthand for a protocol error.
    #[track_caller]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ExplorerErrorKind::Protocol(message.into()))
    }

    /// Message carried by the error kind, without location.
    pub fn message(&self) -> &str {
        match &self.kind {
            ExplorerErrorKind::Validation(m)
            | ExplorerErrorKind::Transport(m)
            | ExplorerErrorKind::ConnectRejected(m)
            | ExplorerErrorKind::Protocol(m) => m,
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<serde_json::Error> for ExplorerError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(format!("Malformed JSON: {}", err))
    }
}

/// Result alias for client operations.
pub type ExplorerResult<T> = Result<T, ExplorerError>;
