//! Winner stays on: the champion keeps playing until beaten.
//!
//! A champion who has beaten every other active player in one reign may rest (bonus point,
//! out of the rotation) or continue. Below the rest threshold there is no rest branch and the
//! rotation simply starts a new lap.

use crate::logic::ledger::Ledger;
use crate::logic::policy::{rank_players, ResultMeta, SchedulingPolicy, Standing};
use crate::logic::registry::FormatInfo;
use crate::logic::setup::{build_roster, finish_tournament, start_tournament};
use crate::models::{
    roster_mut, FormatId, FormatState, GameMatch, GameState, Phase, Player, PlayerId, RecordKind,
    StreakState, TournamentError, TournamentOptions,
};

#[derive(Debug)]
pub struct StreakPolicy {
    options: TournamentOptions,
    ledger: Ledger,
}

impl StreakPolicy {
    pub fn new<S: AsRef<str>>(
        names: &[S],
        options: TournamentOptions,
    ) -> Result<Self, TournamentError> {
        options.validate()?;
        let players = build_roster(names, &FormatInfo::of(FormatId::Streak))?;
        let state = GameState::new(players, FormatState::Streak(StreakState::default()));
        Ok(Self {
            options,
            ledger: Ledger::new(state),
        })
    }

    pub fn streak_state(&self) -> Option<&StreakState> {
        match &self.state().details {
            FormatState::Streak(s) => Some(s),
            _ => None,
        }
    }

    /// True while the champion must choose between resting and continuing.
    pub fn show_rest_option(&self) -> bool {
        self.streak_state().is_some_and(|s| s.show_rest_option)
    }

    pub fn champion(&self) -> Option<&Player> {
        let id = self.streak_state()?.champion?;
        self.state().player(id)
    }

    /// The champion who completed a round and is facing the rest decision.
    pub fn streak_winner(&self) -> Option<&Player> {
        let id = self.streak_state()?.streak_winner?;
        self.state().player(id)
    }
}

fn streak_mut(details: &mut FormatState) -> Result<&mut StreakState, TournamentError> {
    match details {
        FormatState::Streak(s) => Ok(s),
        _ => Err(TournamentError::Internal("streak policy without streak state")),
    }
}

fn open_match(state: &mut GameState, champion: PlayerId, challenger: PlayerId) {
    let ordinal = state.next_ordinal();
    log::debug!("streak match {ordinal}: champion {champion} vs {challenger}");
    state.current_match = Some(GameMatch::new(
        format!("S{ordinal}"),
        [champion, challenger],
        ordinal,
    ));
}

/// Lowest-position active player who is not the champion and not yet beaten this reign.
fn next_challenger(state: &GameState, champion: PlayerId) -> Option<PlayerId> {
    let FormatState::Streak(streak) = &state.details else {
        return None;
    };
    state
        .active_players()
        .map(|p| p.id)
        .find(|id| *id != champion && !streak.beaten.contains(id))
}

/// After a result: offer the rest decision, start a new lap, or call the next challenger.
fn advance(state: &mut GameState, rest_threshold: usize) -> Result<(), TournamentError> {
    let active: Vec<PlayerId> = state.active_players().map(|p| p.id).collect();
    if active.len() < 2 {
        finish_tournament(state);
        return Ok(());
    }
    let streak = streak_mut(&mut state.details)?;
    let champion = streak
        .champion
        .ok_or(TournamentError::Internal("no champion after a result"))?;

    let round_complete = active
        .iter()
        .filter(|id| **id != champion)
        .all(|id| streak.beaten.contains(id));
    if round_complete {
        if active.len() >= rest_threshold {
            streak.show_rest_option = true;
            streak.streak_winner = Some(champion);
            state.current_match = None;
            log::info!("champion {champion} beat everyone; waiting on rest decision");
            return Ok(());
        }
        // too few active players for a rest branch: start another lap
        streak.beaten.clear();
    }

    match next_challenger(state, champion) {
        Some(challenger) => open_match(state, champion, challenger),
        None => {
            log::warn!("no challenger left for champion {champion}; finishing");
            finish_tournament(state);
        }
    }
    Ok(())
}

/// Pick the two players for the match after a rest, lowest positions first.
///
/// The player beaten last sits this one out unless that leaves fewer than two. If still short,
/// resting players come back when `reactivate` is set (never the one who just rested, unless
/// nobody else is available).
fn pair_after_rest(
    state: &mut GameState,
    just_beaten: Option<PlayerId>,
    just_rested: PlayerId,
    reactivate: bool,
) -> Option<(PlayerId, PlayerId)> {
    let eligible = |state: &GameState, skip: Option<PlayerId>| -> Vec<PlayerId> {
        state
            .active_players()
            .map(|p| p.id)
            .filter(|id| Some(*id) != skip)
            .collect()
    };
    let mut candidates = eligible(state, just_beaten);
    if candidates.len() < 2 {
        candidates = eligible(state, None);
    }
    if candidates.len() < 2 && reactivate {
        for p in state
            .players
            .iter_mut()
            .filter(|p| p.is_resting && p.id != just_rested)
        {
            p.is_resting = false;
        }
        candidates = eligible(state, None);
        if candidates.len() < 2 {
            if let Some(p) = state.player_mut(just_rested) {
                p.is_resting = false;
            }
            candidates = eligible(state, None);
        }
        log::info!("rotation ran dry; resting players are back in");
    }
    match candidates.as_slice() {
        [first, second, ..] => Some((*first, *second)),
        _ => None,
    }
}

impl SchedulingPolicy for StreakPolicy {
    fn format(&self) -> FormatId {
        FormatId::Streak
    }

    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Seat 0 is the first champion and meets seat 1.
    fn start(&mut self) -> Result<&GameState, TournamentError> {
        self.ledger.commit(|state| {
            start_tournament(state)?;
            let seats: Vec<PlayerId> = state.active_players().map(|p| p.id).collect();
            let (champion, challenger) = match seats.as_slice() {
                [first, second, ..] => (*first, *second),
                _ => return Err(TournamentError::Internal("streak needs two players to start")),
            };
            let streak = streak_mut(&mut state.details)?;
            *streak = StreakState {
                champion: Some(champion),
                ..StreakState::default()
            };
            open_match(state, champion, challenger);
            Ok(())
        })
    }

    fn apply_result(
        &mut self,
        winner: PlayerId,
        meta: Option<ResultMeta>,
    ) -> Result<&GameState, TournamentError> {
        let rest_threshold = self.options.rest_threshold;
        self.ledger.commit(|state| {
            let current = state
                .current_match
                .clone()
                .ok_or(TournamentError::NoCurrentMatch)?;
            let loser = current
                .opponent_of(winner)
                .ok_or(TournamentError::WinnerNotInMatch(winner))?;
            let meta = meta.unwrap_or_default();
            meta.require_winner(FormatId::Streak)?;

            let w = roster_mut(&mut state.players, winner)?;
            w.add_win(1);
            if let Some((scored, conceded)) = meta.score {
                w.add_goals(scored, conceded);
            }
            let l = roster_mut(&mut state.players, loser)?;
            l.add_loss(0);
            if let Some((scored, conceded)) = meta.score {
                l.add_goals(conceded, scored);
            }
            state.record_win(Some(current.id), winner, loser, None)?;
            state.current_match = None;

            let streak = streak_mut(&mut state.details)?;
            if streak.champion == Some(winner) {
                streak.beaten.insert(loser);
            } else {
                log::debug!("{winner} dethroned champion {loser}");
                streak.champion = Some(winner);
                streak.beaten.clear();
                streak.beaten.insert(loser);
            }
            streak.last_beaten = Some(loser);
            advance(state, rest_threshold)
        })
    }

    fn take_rest(&mut self) -> Result<&GameState, TournamentError> {
        let bonus = self.options.rest_bonus;
        let reactivate = self.options.reactivate_resting;
        self.ledger.commit(|state| {
            state.require_phase(Phase::Playing)?;
            let streak = streak_mut(&mut state.details)?;
            if !streak.show_rest_option {
                return Err(TournamentError::NoRestDecisionPending);
            }
            let resting = streak
                .streak_winner
                .ok_or(TournamentError::Internal("rest decision without a streak winner"))?;
            let just_beaten = streak.last_beaten;
            *streak = StreakState::default();

            roster_mut(&mut state.players, resting)?.take_rest(bonus);
            state.record_event(RecordKind::Rest, None, Some(resting), None);
            log::info!("{resting} takes a rest");

            match pair_after_rest(state, just_beaten, resting, reactivate) {
                Some((champion, challenger)) => {
                    streak_mut(&mut state.details)?.champion = Some(champion);
                    open_match(state, champion, challenger);
                }
                None => finish_tournament(state),
            }
            Ok(())
        })
    }

    fn continue_play(&mut self) -> Result<&GameState, TournamentError> {
        self.ledger.commit(|state| {
            state.require_phase(Phase::Playing)?;
            let streak = streak_mut(&mut state.details)?;
            if !streak.show_rest_option {
                return Err(TournamentError::NoRestDecisionPending);
            }
            let champion = streak
                .streak_winner
                .ok_or(TournamentError::Internal("rest decision without a streak winner"))?;
            streak.show_rest_option = false;
            streak.streak_winner = None;
            streak.beaten.clear();
            log::info!("{champion} plays on");

            match next_challenger(state, champion) {
                Some(challenger) => open_match(state, champion, challenger),
                None => finish_tournament(state),
            }
            Ok(())
        })
    }

    /// Score, then current run, then seat.
    fn standings(&self) -> Vec<Standing> {
        rank_players(&self.state().players, |a, b| {
            b.score
                .cmp(&a.score)
                .then(b.win_streak.cmp(&a.win_streak))
        })
    }
}
