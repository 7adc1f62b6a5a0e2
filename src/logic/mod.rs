//! Tournament business logic: the scheduling policies and the machinery they share.

mod elimination;
mod fixed_sequence;
mod ledger;
mod policy;
mod registry;
mod round_robin;
mod setup;
mod streak;
mod undo;

pub use elimination::{bracket_pairs, round_count, seeded_pairs, slots_in_round, EliminationPolicy};
pub use fixed_sequence::{sequence_match_id, FixedSequencePolicy, SEQUENCE};
pub use ledger::{Ledger, Publisher};
pub use policy::{rank_players, ResultMeta, SchedulingPolicy, Standing};
pub use registry::{DurationEstimate, FormatInfo, PolicyManager};
pub use round_robin::{generate_schedule, RoundRobinPolicy};
pub use setup::{build_roster, finish_tournament, start_tournament};
pub use streak::StreakPolicy;
pub use undo::UndoStack;
