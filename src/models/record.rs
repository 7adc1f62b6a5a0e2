//! Match history entries and the replication wire record.

use crate::models::game::MatchId;
use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a history entry describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Win,
    Draw,
    /// Streak champion left the rotation with a bonus.
    Rest,
    /// Elimination slot advanced without a match.
    Bye,
    /// Tournament ended manually.
    Ended,
}

/// Immutable, append-only history entry. Undo drops entries by restoring a snapshot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 1-based position in the history.
    pub ordinal: u32,
    pub kind: RecordKind,
    /// Id of the match this settles; absent for rest and end pseudo-events.
    pub match_id: Option<MatchId>,
    pub winner_id: Option<PlayerId>,
    pub winner_name: String,
    pub loser_id: Option<PlayerId>,
    pub loser_name: Option<String>,
    /// Winner's score after the entry was applied.
    pub score: u32,
    /// Fixed-sequence index, when the format has one.
    pub sequence_index: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

/// A match result as exchanged between devices. `match_id` (and `sequence_index`
/// for fixed schedules) is the idempotency key: a key seen before is a no-op.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedResult {
    pub sequence_index: Option<usize>,
    pub match_id: MatchId,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub winner_name: String,
    pub loser_name: String,
    pub timestamp: DateTime<Utc>,
}

impl ReplicatedResult {
    /// Wire form of a decided match from history (draws and pseudo-events have no wire form).
    pub fn from_record(record: &MatchRecord) -> Option<Self> {
        if record.kind != RecordKind::Win {
            return None;
        }
        Some(Self {
            sequence_index: record.sequence_index,
            match_id: record.match_id.clone()?,
            winner_id: record.winner_id?,
            loser_id: record.loser_id?,
            winner_name: record.winner_name.clone(),
            loser_name: record.loser_name.clone()?,
            timestamp: record.timestamp,
        })
    }
}
