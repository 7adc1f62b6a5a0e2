//! The contract every tournament format implements.

use crate::logic::ledger::{Ledger, Publisher};
use crate::models::{
    FormatId, GameMatch, GameState, MatchRecord, Phase, Player, PlayerId, RecordKind,
    ReplicatedResult, TournamentError, TournamentSnapshot,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Optional detail reported with a result.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultMeta {
    /// The match was drawn (formats that allow draws only).
    pub draw: bool,
    /// Goals as (reported player, opponent).
    pub score: Option<(u32, u32)>,
}

impl ResultMeta {
    pub fn score(scored: u32, conceded: u32) -> Self {
        Self {
            draw: false,
            score: Some((scored, conceded)),
        }
    }

    pub fn draw() -> Self {
        Self {
            draw: true,
            score: None,
        }
    }

    /// Check the score agrees with the outcome: winner strictly ahead, or level for a draw.
    pub fn check(&self) -> Result<(), TournamentError> {
        match self.score {
            Some((a, b)) if self.draw && a != b => Err(TournamentError::InvalidScore(format!(
                "a draw must be level, got {a}-{b}"
            ))),
            Some((a, b)) if !self.draw && a <= b => Err(TournamentError::InvalidScore(format!(
                "the winner must score more, got {a}-{b}"
            ))),
            _ => Ok(()),
        }
    }

    /// Reject draws in formats where every match needs a winner.
    pub fn require_winner(&self, format: FormatId) -> Result<(), TournamentError> {
        if self.draw {
            return Err(TournamentError::InvalidScore(format!(
                "{format} matches cannot be drawn"
            )));
        }
        self.check()
    }
}

/// One row of the standings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based; strictly increasing, never shared.
    pub rank: usize,
    pub player: Player,
}

/// Rank players by `cmp`, breaking any remaining tie by seat position.
pub fn rank_players<F>(players: &[Player], mut cmp: F) -> Vec<Standing>
where
    F: FnMut(&Player, &Player) -> Ordering,
{
    let mut sorted: Vec<Player> = players.to_vec();
    sorted.sort_by(|a, b| cmp(a, b).then(a.position.cmp(&b.position)));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, player)| Standing { rank: i + 1, player })
        .collect()
}

/// True if the relayed winner and loser are exactly the two fighters of `current`.
pub fn names_both_fighters(current: &GameMatch, result: &ReplicatedResult) -> bool {
    current.opponent_of(result.winner_id) == Some(result.loser_id)
}

/// A scheduling policy: decides who plays whom, applies results and ranks players.
///
/// Implementations own their state through a [`Ledger`]; callers only get read-only views and
/// must go through these methods to change anything. Calls must be serialized by the caller.
pub trait SchedulingPolicy: Send {
    fn format(&self) -> FormatId;

    fn ledger(&self) -> &Ledger;

    fn ledger_mut(&mut self) -> &mut Ledger;

    /// Move from setup to playing and produce the first match.
    fn start(&mut self) -> Result<&GameState, TournamentError>;

    /// Apply the result of the current match. `winner` must be one of its fighters.
    fn apply_result(
        &mut self,
        winner: PlayerId,
        meta: Option<ResultMeta>,
    ) -> Result<&GameState, TournamentError>;

    /// Players in final-table order.
    fn standings(&self) -> Vec<Standing>;

    fn state(&self) -> &GameState {
        self.ledger().state()
    }

    fn version(&self) -> u64 {
        self.ledger().version()
    }

    fn players(&self) -> &[Player] {
        &self.state().players
    }

    fn history(&self) -> &[MatchRecord] {
        &self.state().history
    }

    fn current_match(&self) -> Option<&GameMatch> {
        self.state().current_match.as_ref()
    }

    /// The match to play now, or `None` when finished or waiting on a side decision.
    fn next_match(&self) -> Option<GameMatch> {
        match self.state().phase {
            Phase::Playing => self.state().current_match.clone(),
            Phase::Setup | Phase::Finished => None,
        }
    }

    fn is_finished(&self) -> bool {
        self.state().phase == Phase::Finished
    }

    /// Champion of a finished tournament.
    fn winner(&self) -> Option<&Player> {
        if !self.is_finished() {
            return None;
        }
        let top = self.standings().into_iter().next()?;
        self.state().player(top.player.id)
    }

    fn undo(&mut self) -> Result<&GameState, TournamentError> {
        self.ledger_mut().undo()
    }

    fn can_undo(&self) -> bool {
        self.ledger().undo_depth() > 0
    }

    /// Finish now, freezing the current standings as final.
    fn end_early(&mut self) -> Result<&GameState, TournamentError> {
        self.ledger_mut().commit(|state| {
            if state.phase == Phase::Finished {
                return Err(TournamentError::InvalidPhase {
                    expected: Phase::Playing,
                    found: Phase::Finished,
                });
            }
            state.record_event(RecordKind::Ended, None, None, None);
            crate::logic::setup::finish_tournament(state);
            Ok(())
        })
    }

    /// Streak format only: the champion leaves the rotation with a bonus.
    fn take_rest(&mut self) -> Result<&GameState, TournamentError> {
        Err(TournamentError::Unsupported {
            action: "take_rest",
            format: self.format(),
        })
    }

    /// Streak format only: the champion declines the rest and plays on.
    fn continue_play(&mut self) -> Result<&GameState, TournamentError> {
        Err(TournamentError::Unsupported {
            action: "continue_play",
            format: self.format(),
        })
    }

    fn snapshot(&self) -> TournamentSnapshot {
        self.ledger().snapshot()
    }

    /// Apply a remote snapshot if newer than the local state. `Ok(false)` means it was stale.
    fn load_snapshot(&mut self, snapshot: TournamentSnapshot) -> Result<bool, TournamentError> {
        self.ledger_mut().load(snapshot)
    }

    fn set_publisher(&mut self, publisher: Publisher) {
        self.ledger_mut().set_publisher(publisher);
    }

    /// Apply a result received from another device, at most once per match id.
    ///
    /// Already-settled and stale (not the current match) results return `Ok(false)`, as do
    /// results whose winner and loser are not the two fighters of the match.
    fn apply_replicated(&mut self, result: &ReplicatedResult) -> Result<bool, TournamentError> {
        let state = self.state();
        if state.has_settled(&result.match_id) {
            log::debug!("duplicate result for {} ignored", result.match_id);
            return Ok(false);
        }
        match &state.current_match {
            Some(m) if m.id == result.match_id => {
                if !names_both_fighters(m, result) {
                    log::warn!("result for {} names the wrong fighters; discarded", m.id);
                    return Ok(false);
                }
            }
            _ => {
                log::debug!("stale result for {} ignored", result.match_id);
                return Ok(false);
            }
        }
        self.apply_result(result.winner_id, None)?;
        Ok(true)
    }
}
