//! Format registry: what each format accepts, how long it takes, and how to create one.

use crate::logic::elimination::EliminationPolicy;
use crate::logic::fixed_sequence::FixedSequencePolicy;
use crate::logic::policy::SchedulingPolicy;
use crate::logic::round_robin::RoundRobinPolicy;
use crate::logic::streak::StreakPolicy;
use crate::models::{FormatId, TournamentError, TournamentOptions};
use serde::Serialize;

/// Static description of a format.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FormatInfo {
    pub id: FormatId,
    pub name: &'static str,
    pub description: &'static str,
    pub min_players: usize,
    pub max_players: usize,
    /// Rough length of one match, for duration estimates.
    pub minutes_per_match: u32,
    pub requires_unique_names: bool,
}

impl FormatInfo {
    pub fn of(id: FormatId) -> Self {
        match id {
            FormatId::Streak => Self {
                id,
                name: "Winner stays on",
                description: "The champion stays in the arena until beaten; after beating everyone once they may rest for a bonus point.",
                min_players: 3,
                max_players: 8,
                minutes_per_match: 3,
                requires_unique_names: false,
            },
            FormatId::Elimination => Self {
                id,
                name: "Single elimination",
                description: "Seeded knockout bracket; odd counts give byes.",
                min_players: 2,
                max_players: 32,
                minutes_per_match: 5,
                requires_unique_names: false,
            },
            FormatId::RoundRobin => Self {
                id,
                name: "Round robin",
                description: "Everyone plays everyone; points for wins and draws.",
                min_players: 3,
                max_players: 8,
                minutes_per_match: 5,
                requires_unique_names: false,
            },
            FormatId::FixedSequence => Self {
                id,
                name: "Fixed sequence",
                description: "Four players, six matches in a fixed order (AB, CD, CA, BD, BC, AD).",
                min_players: 4,
                max_players: 4,
                minutes_per_match: 4,
                requires_unique_names: true,
            },
        }
    }

    pub fn accepts(&self, players: usize) -> bool {
        (self.min_players..=self.max_players).contains(&players)
    }
}

/// Expected size of a tournament.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct DurationEstimate {
    pub matches: u32,
    pub minutes: u32,
}

/// Maps format ids to policies. Holds the default options new tournaments start from.
#[derive(Clone, Debug, Default)]
pub struct PolicyManager {
    defaults: TournamentOptions,
}

impl PolicyManager {
    pub fn new(defaults: TournamentOptions) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &TournamentOptions {
        &self.defaults
    }

    pub fn formats(&self) -> Vec<FormatInfo> {
        FormatId::ALL.into_iter().map(FormatInfo::of).collect()
    }

    /// Check a player count against the format's range.
    pub fn validate(&self, format: FormatId, players: usize) -> Result<(), TournamentError> {
        let info = FormatInfo::of(format);
        if !info.accepts(players) {
            return Err(TournamentError::PlayerCount {
                format,
                min: info.min_players,
                max: info.max_players,
                found: players,
            });
        }
        Ok(())
    }

    pub fn estimate(
        &self,
        format: FormatId,
        players: usize,
        options: Option<&TournamentOptions>,
    ) -> Result<DurationEstimate, TournamentError> {
        self.validate(format, players)?;
        let options = options.unwrap_or(&self.defaults);
        let n = players as u32;
        let matches = match format {
            // open-ended; one full lap through the field per player
            FormatId::Streak => n * (n - 1),
            FormatId::Elimination => n - 1,
            FormatId::RoundRobin => {
                let single = n * (n - 1) / 2;
                if options.double_round_robin {
                    single * 2
                } else {
                    single
                }
            }
            FormatId::FixedSequence => 6,
        };
        Ok(DurationEstimate {
            matches,
            minutes: matches * FormatInfo::of(format).minutes_per_match,
        })
    }

    /// Validate and create a policy in Setup. `options` overrides the manager defaults.
    pub fn create<S: AsRef<str>>(
        &self,
        format: FormatId,
        names: &[S],
        options: Option<TournamentOptions>,
    ) -> Result<Box<dyn SchedulingPolicy>, TournamentError> {
        self.validate(format, names.len())?;
        let options = options.unwrap_or_else(|| self.defaults.clone());
        let policy: Box<dyn SchedulingPolicy> = match format {
            FormatId::Streak => Box::new(StreakPolicy::new(names, options)?),
            FormatId::Elimination => Box::new(EliminationPolicy::new(names, options)?),
            FormatId::RoundRobin => Box::new(RoundRobinPolicy::new(names, options)?),
            FormatId::FixedSequence => Box::new(FixedSequencePolicy::new(names, options)?),
        };
        log::debug!("created {format} tournament for {} players", names.len());
        Ok(policy)
    }
}
