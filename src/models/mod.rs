//! Data structures for the tournament engine: players, matches, history, state, options.

mod error;
mod game;
mod options;
mod player;
mod record;
mod state;

pub use error::{ErrorKind, TournamentError};
pub use game::{GameMatch, MatchId};
pub use options::{PointsConfig, Seeding, TournamentOptions};
pub use player::{seat_label, Player, PlayerId, PlayerStats};
pub use record::{MatchRecord, RecordKind, ReplicatedResult};
pub use state::{
    roster_mut, Bracket, BracketMatch, FormatId, FormatState, GameState, Outcome, Phase,
    RoundRobinState, ScheduledMatch, SequenceState, SlotStatus, StreakState, TournamentId,
    TournamentSnapshot,
};
