//! The current pairing between two players.

use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Identifier for a match, unique within one tournament.
///
/// Derived from the format and the match's place in it (ordinal, bracket slot, schedule index),
/// so every device computes the same id for the same match.
pub type MatchId = String;

/// A single head-to-head match. Fighters are referenced by id, so stat changes stay visible
/// through the match. A match is never edited: the next decision replaces it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub fighters: [PlayerId; 2],
    /// 1-based count of matches produced in this tournament.
    pub ordinal: u32,
    /// Bracket round (elimination) or leg (round robin).
    pub round: Option<u32>,
    /// Seat-label pattern such as `"CA"` (fixed sequence).
    pub pattern: Option<String>,
}

impl GameMatch {
    pub fn new(id: impl Into<MatchId>, fighters: [PlayerId; 2], ordinal: u32) -> Self {
        Self {
            id: id.into(),
            fighters,
            ordinal,
            round: None,
            pattern: None,
        }
    }

    pub fn in_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// The other fighter, if `id` is in this match.
    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        match self.fighters {
            [a, b] if a == id => Some(b),
            [a, b] if b == id => Some(a),
            _ => None,
        }
    }
}
