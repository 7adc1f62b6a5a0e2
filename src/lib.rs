//! Head-to-head tournament engine: library with models and scheduling policies.

pub mod logic;
pub mod models;

pub use logic::{
    generate_schedule, rank_players, round_count, sequence_match_id, DurationEstimate,
    EliminationPolicy, FixedSequencePolicy, FormatInfo, Ledger, PolicyManager, Publisher,
    ResultMeta, RoundRobinPolicy, SchedulingPolicy, Standing, StreakPolicy, UndoStack, SEQUENCE,
};
pub use models::{
    Bracket, BracketMatch, ErrorKind, FormatId, FormatState, GameMatch, GameState, MatchId,
    MatchRecord, Outcome, Phase, Player, PlayerId, PlayerStats, PointsConfig, RecordKind,
    ReplicatedResult, RoundRobinState, ScheduledMatch, Seeding, SequenceState, SlotStatus,
    StreakState, TournamentError, TournamentId, TournamentOptions, TournamentSnapshot,
};
