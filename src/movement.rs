//! Move vectors and movement outcomes.

use crate::error::{ExplorerError, ExplorerResult};
use crate::tile::Tile;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A relative displacement requested for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct MoveVector {
    /// Horizontal displacement.
    pub dx: i64,
    /// Vertical displacement.
    pub dy: i64,
}

/// Inputs accepted as a `(dx, dy)` move.
///
/// Fixed-size pairs always convert; slices and vectors must have exactly
/// two elements.
pub trait IntoMoveVector {
    /// Converts into a move vector, rejecting any shape other than two elements.
    fn into_move_vector(self) -> ExplorerResult<MoveVector>;
}

impl IntoMoveVector for MoveVector {
    fn into_move_vector(self) -> ExplorerResult<MoveVector> {
        Ok(self)
    }
}

impl<T: Into<i64>> IntoMoveVector for (T, T) {
    fn into_move_vector(self) -> ExplorerResult<MoveVector> {
        Ok(MoveVector::new(self.0.into(), self.1.into()))
    }
}

impl<T: Into<i64>> IntoMoveVector for [T; 2] {
    fn into_move_vector(self) -> ExplorerResult<MoveVector> {
        let [dx, dy] = self;
        Ok(MoveVector::new(dx.into(), dy.into()))
    }
}

impl<T: Into<i64> + Copy> IntoMoveVector for &[T] {
    #[track_caller]
    fn into_move_vector(self) -> ExplorerResult<MoveVector> {
        match self {
            [dx, dy] => Ok(MoveVector::new((*dx).into(), (*dy).into())),
            other => Err(ExplorerError::validation(format!(
                "move must be a length-2 sequence, got length {}",
                other.len()
            ))),
        }
    }
}

impl<T: Into<i64> + Copy> IntoMoveVector for &Vec<T> {
    #[track_caller]
    fn into_move_vector(self) -> ExplorerResult<MoveVector> {
        self.as_slice().into_move_vector()
    }
}

impl<T: Into<i64> + Copy> IntoMoveVector for Vec<T> {
    #[track_caller]
    fn into_move_vector(self) -> ExplorerResult<MoveVector> {
        self.as_slice().into_move_vector()
    }
}

/// Validates a move locally, before any request is made.
#[instrument(skip(input))]
pub fn normalize_move(input: impl IntoMoveVector) -> ExplorerResult<MoveVector> {
    input.into_move_vector()
}

/// Outcome of one movement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct MovementResult {
    moved_successfully: bool,
    agent_alive: bool,
    discovered_tile: Option<Tile>,
}

impl MovementResult {
    /// Result used when a move could not be carried out or observed.
    pub fn failed() -> Self {
        Self::new(false, false, None)
    }

    /// True if the move executed.
    pub fn moved_successfully(&self) -> bool {
        self.moved_successfully
    }

    /// True if the agent survived the move.
    pub fn is_agent_alive(&self) -> bool {
        self.agent_alive
    }

    /// Tile discovered by this move, if any.
    pub fn discovered_tile(&self) -> Option<Tile> {
        self.discovered_tile
    }
}
