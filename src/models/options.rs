//! Tournament configuration chosen at initialize time.

use crate::models::error::TournamentError;
use serde::{Deserialize, Serialize};

/// How an elimination bracket orders its seeds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeding {
    /// Seat order.
    #[default]
    Position,
    /// Shuffled (reproducible with `rng_seed`).
    Random,
    /// Current score, highest first; seat order breaks ties.
    Score,
}

/// Points awarded per outcome (round robin; soccer-style by default).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

/// Options for one tournament. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentOptions {
    pub seeding: Seeding,
    pub rng_seed: Option<u64>,
    pub double_round_robin: bool,
    pub allow_draws: bool,
    pub points: PointsConfig,
    /// Minimum active players before a streak champion may rest.
    pub rest_threshold: usize,
    pub rest_bonus: u32,
    /// Bring resting players back when the rotation would otherwise run dry.
    pub reactivate_resting: bool,
}

impl Default for TournamentOptions {
    fn default() -> Self {
        Self {
            seeding: Seeding::Position,
            rng_seed: None,
            double_round_robin: false,
            allow_draws: true,
            points: PointsConfig::default(),
            rest_threshold: 4,
            rest_bonus: 1,
            reactivate_resting: false,
        }
    }
}

impl TournamentOptions {
    pub fn validate(&self) -> Result<(), TournamentError> {
        if self.rest_threshold < 2 {
            return Err(TournamentError::InvalidOptions(format!(
                "rest_threshold must be at least 2 (got {})",
                self.rest_threshold
            )));
        }
        let p = self.points;
        if p.win < p.draw || p.draw < p.loss {
            return Err(TournamentError::InvalidOptions(
                "points must satisfy win >= draw >= loss".to_string(),
            ));
        }
        Ok(())
    }
}
