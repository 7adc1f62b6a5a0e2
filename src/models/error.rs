//! Error taxonomy for every tournament operation.

use crate::models::player::PlayerId;
use crate::models::state::{FormatId, Phase};
use thiserror::Error;

/// Coarse class of a [`TournamentError`], for hosts that only care what went wrong in general.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Bad input at initialize time; no tournament was created.
    Validation,
    /// A result was reported that does not fit the current match.
    InvalidResult,
    /// Undo requested with nothing to undo.
    NoHistory,
    /// The action is not legal in the current phase or format.
    IllegalAction,
    /// An internal invariant was broken.
    Internal,
}

/// Errors that can occur during tournament operations.
///
/// A failed operation never changes the tournament: state, version and undo stack stay as they were.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    #[error("{format} needs between {min} and {max} players (got {found})")]
    PlayerCount {
        format: FormatId,
        min: usize,
        max: usize,
        found: usize,
    },

    #[error("Player names must not be empty")]
    EmptyName,

    #[error("A player named {0:?} already exists")]
    DuplicatePlayerName(String),

    #[error("Invalid tournament options: {0}")]
    InvalidOptions(String),

    #[error("Unknown tournament format: {0:?}")]
    UnknownFormat(String),

    #[error("There is no match in progress")]
    NoCurrentMatch,

    #[error("Player {0} is not in the current match")]
    WinnerNotInMatch(PlayerId),

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Nothing to undo")]
    NoHistory,

    #[error("Invalid phase for this action: expected {expected:?}, found {found:?}")]
    InvalidPhase { expected: Phase, found: Phase },

    #[error("No rest decision is pending")]
    NoRestDecisionPending,

    #[error("{action} is not supported by the {format} format")]
    Unsupported {
        action: &'static str,
        format: FormatId,
    },

    #[error("Snapshot is for the {found} format, this tournament is {expected}")]
    SnapshotFormatMismatch { expected: FormatId, found: FormatId },

    #[error("Internal error: {0}")]
    Internal(&'static str),
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        use TournamentError::*;
        match self {
            PlayerCount { .. }
            | EmptyName
            | DuplicatePlayerName(_)
            | InvalidOptions(_)
            | UnknownFormat(_) => ErrorKind::Validation,
            NoCurrentMatch | WinnerNotInMatch(_) | InvalidScore(_) => ErrorKind::InvalidResult,
            NoHistory => ErrorKind::NoHistory,
            InvalidPhase { .. }
            | NoRestDecisionPending
            | Unsupported { .. }
            | SnapshotFormatMismatch { .. } => ErrorKind::IllegalAction,
            Internal(_) => ErrorKind::Internal,
        }
    }
}
