//! Fixed sequence: four players, six matches, every pair exactly once, same order on every device.

use crate::logic::ledger::Ledger;
use crate::logic::policy::{
    names_both_fighters, rank_players, ResultMeta, SchedulingPolicy, Standing,
};
use crate::logic::registry::FormatInfo;
use crate::logic::setup::{build_roster, finish_tournament, start_tournament};
use crate::models::{
    roster_mut, FormatId, FormatState, GameMatch, GameState, PlayerId, ReplicatedResult,
    SequenceState, TournamentError, TournamentOptions,
};

/// Seat pairs of the schedule: AB, CD, CA, BD, BC, AD.
pub const SEQUENCE: [(usize, usize); 6] = [(0, 1), (2, 3), (2, 0), (1, 3), (1, 2), (0, 3)];

/// Match id for a 0-based sequence index; identical on every device.
pub fn sequence_match_id(index: usize) -> String {
    format!("SEQ{}", index + 1)
}

#[derive(Debug)]
pub struct FixedSequencePolicy {
    ledger: Ledger,
}

impl FixedSequencePolicy {
    pub fn new<S: AsRef<str>>(
        names: &[S],
        options: TournamentOptions,
    ) -> Result<Self, TournamentError> {
        options.validate()?;
        let players = build_roster(names, &FormatInfo::of(FormatId::FixedSequence))?;
        let state = GameState::new(
            players,
            FormatState::FixedSequence(SequenceState::default()),
        );
        Ok(Self {
            ledger: Ledger::new(state),
        })
    }

    pub fn sequence(&self) -> Option<&SequenceState> {
        match &self.state().details {
            FormatState::FixedSequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Results recorded so far, tagged with their sequence index.
    pub fn completed_matches(&self) -> &[ReplicatedResult] {
        self.sequence()
            .map(|seq| seq.completed.as_slice())
            .unwrap_or_default()
    }
}

fn sequence_mut(details: &mut FormatState) -> Result<&mut SequenceState, TournamentError> {
    match details {
        FormatState::FixedSequence(seq) => Ok(seq),
        _ => Err(TournamentError::Internal("fixed sequence policy without sequence state")),
    }
}

/// Open the match at the current index, or finish after the sixth.
fn advance(state: &mut GameState) -> Result<(), TournamentError> {
    let index = sequence_mut(&mut state.details)?.index;
    let Some(&(a, b)) = SEQUENCE.get(index) else {
        finish_tournament(state);
        return Ok(());
    };
    let (first, second) = match (state.players.get(a), state.players.get(b)) {
        (Some(first), Some(second)) => (first, second),
        _ => return Err(TournamentError::Internal("fixed sequence seat out of range")),
    };
    let fighters = [first.id, second.id];
    let pattern = format!("{}{}", first.label, second.label);
    let ordinal = state.next_ordinal();
    log::debug!("sequence match {} ({pattern})", index + 1);
    state.current_match =
        Some(GameMatch::new(sequence_match_id(index), fighters, ordinal).with_pattern(pattern));
    Ok(())
}

impl SchedulingPolicy for FixedSequencePolicy {
    fn format(&self) -> FormatId {
        FormatId::FixedSequence
    }

    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    fn start(&mut self) -> Result<&GameState, TournamentError> {
        self.ledger.commit(|state| {
            start_tournament(state)?;
            *sequence_mut(&mut state.details)? = SequenceState::default();
            advance(state)
        })
    }

    fn apply_result(
        &mut self,
        winner: PlayerId,
        meta: Option<ResultMeta>,
    ) -> Result<&GameState, TournamentError> {
        self.ledger.commit(|state| {
            let current = state
                .current_match
                .clone()
                .ok_or(TournamentError::NoCurrentMatch)?;
            let loser = current
                .opponent_of(winner)
                .ok_or(TournamentError::WinnerNotInMatch(winner))?;
            meta.unwrap_or_default()
                .require_winner(FormatId::FixedSequence)?;
            let index = sequence_mut(&mut state.details)?.index;

            roster_mut(&mut state.players, winner)?.add_win(1);
            roster_mut(&mut state.players, loser)?.add_loss(0);
            state.record_win(Some(current.id), winner, loser, Some(index))?;
            let entry = state
                .history
                .last()
                .and_then(ReplicatedResult::from_record)
                .ok_or(TournamentError::Internal("recorded result has no wire form"))?;

            let seq = sequence_mut(&mut state.details)?;
            seq.completed.push(entry);
            seq.index += 1;
            state.current_match = None;
            advance(state)
        })
    }

    /// Points (one per win), wins, fewest losses, seat.
    fn standings(&self) -> Vec<Standing> {
        rank_players(&self.state().players, |a, b| {
            b.score
                .cmp(&a.score)
                .then(b.wins.cmp(&a.wins))
                .then(a.losses.cmp(&b.losses))
        })
    }

    /// Keyed by sequence index: an index already completed is a no-op, and only the
    /// current index is accepted.
    fn apply_replicated(&mut self, result: &ReplicatedResult) -> Result<bool, TournamentError> {
        let index = match result.sequence_index {
            Some(i) => i,
            None => match (0..SEQUENCE.len()).find(|i| sequence_match_id(*i) == result.match_id) {
                Some(i) => i,
                None => return Ok(false),
            },
        };
        let seq = self
            .sequence()
            .ok_or(TournamentError::Internal("fixed sequence policy without sequence state"))?;
        if seq.completed.iter().any(|r| r.sequence_index == Some(index)) {
            log::debug!("duplicate result for sequence index {index} ignored");
            return Ok(false);
        }
        let current = match &self.state().current_match {
            Some(m) if index == seq.index => m,
            _ => {
                log::debug!("out-of-order result for sequence index {index} ignored");
                return Ok(false);
            }
        };
        if !names_both_fighters(current, result) {
            log::warn!("result for sequence index {index} names the wrong fighters; discarded");
            return Ok(false);
        }
        self.apply_result(result.winner_id, None)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_spells_the_schedule() {
        let labels = ["A", "B", "C", "D"];
        let spelled: Vec<String> = SEQUENCE
            .iter()
            .map(|&(a, b)| format!("{}{}", labels[a], labels[b]))
            .collect();
        assert_eq!(spelled, ["AB", "CD", "CA", "BD", "BC", "AD"]);
    }
}
