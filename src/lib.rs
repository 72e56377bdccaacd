//! Remote Explorer client library.
//!
//! Creates agents on a remote grid-world server, moves them with relative
//! `(dx, dy)` commands and tracks their survival and discoveries.
//!
//! # Architecture
//!
//! - **Factory**: performs the `/connect` handshake and binds sessions
//! - **Session**: blocking, awaitable and background moves over one agent
//! - **Handle**: single-assignment result of a background move, pollable or waitable
//! - **Transport**: the HTTP seam, replaceable for tests or custom stacks
//!
//! # Example
//!
//! ```no_run
//! use remote_explorer::{ClientConfig, Color, RemoteGameSessionFactory, VisualSessionIdentifier};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), remote_explorer::ExplorerError> {
//! let config = ClientConfig::new("http://127.0.0.1:8080/").with_username("Example");
//! let factory = RemoteGameSessionFactory::new(&config)?;
//! let session = factory.create(VisualSessionIdentifier::new("[]", Color::Magenta)?)?;
//!
//! let result = session.move_agent((1, 0))?;
//! println!("alive={}, moved={}", result.is_agent_alive(), result.moved_successfully());
//!
//! let handle = session.move_async((0, 1))?;
//! if let Some(result) = handle.wait(Some(Duration::from_secs(5))) {
//!     println!("tile={:?}", result.discovered_tile());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod color;
mod config;
mod dispatch;
mod error;
mod factory;
mod handle;
mod identifier;
mod movement;
mod protocol;
mod session;
mod tile;
mod transport;

// Crate-level exports - Value types
pub use color::Color;
pub use movement::{IntoMoveVector, MoveVector, MovementResult, normalize_move};
pub use tile::Tile;

// Crate-level exports - Identifiers
pub use identifier::{IdentifierInput, MAX_LABEL_CHARS, SessionIdentifier, VisualSessionIdentifier};

// Crate-level exports - Sessions
pub use dispatch::Dispatcher;
pub use factory::RemoteGameSessionFactory;
pub use handle::AsyncMovementResult;
pub use session::{RemoteGameSession, SessionId};

// Crate-level exports - Protocol and transport
pub use protocol::{Endpoint, MoveDecoding, SessionState, decode_connect_response, decode_move_response};
pub use transport::{HttpTransport, Transport};

// Crate-level exports - Configuration and errors
pub use config::{ClientConfig, ConfigError, SERVER_URL_ENV, USERNAME_ENV};
pub use error::{ExplorerError, ExplorerErrorKind, ExplorerResult};
