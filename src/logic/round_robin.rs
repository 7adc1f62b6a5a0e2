//! Round robin: every pair meets once (twice with the return leg), fixtures consumed in order.

use crate::logic::ledger::Ledger;
use crate::logic::policy::{rank_players, ResultMeta, SchedulingPolicy, Standing};
use crate::logic::registry::FormatInfo;
use crate::logic::setup::{build_roster, finish_tournament, start_tournament};
use crate::models::{
    roster_mut, FormatId, FormatState, GameMatch, GameState, Outcome, PlayerId, RecordKind,
    RoundRobinState, ScheduledMatch, TournamentError, TournamentOptions,
};

/// All unordered pairs in seat order; the return leg swaps home and away.
pub fn generate_schedule(seats: &[PlayerId], double: bool) -> Vec<ScheduledMatch> {
    let legs = if double { 2 } else { 1 };
    let pairs = seats.len() * seats.len().saturating_sub(1) / 2;
    let mut schedule = Vec::with_capacity(pairs * legs);
    for leg in 1..=legs as u32 {
        for i in 0..seats.len() {
            for j in i + 1..seats.len() {
                let (home, away) = if leg == 1 {
                    (seats[i], seats[j])
                } else {
                    (seats[j], seats[i])
                };
                schedule.push(ScheduledMatch {
                    id: format!("RR{}", schedule.len() + 1),
                    leg,
                    home,
                    away,
                    outcome: None,
                });
            }
        }
    }
    schedule
}

#[derive(Debug)]
pub struct RoundRobinPolicy {
    options: TournamentOptions,
    ledger: Ledger,
}

impl RoundRobinPolicy {
    pub fn new<S: AsRef<str>>(
        names: &[S],
        options: TournamentOptions,
    ) -> Result<Self, TournamentError> {
        options.validate()?;
        let players = build_roster(names, &FormatInfo::of(FormatId::RoundRobin))?;
        let state = GameState::new(
            players,
            FormatState::RoundRobin(RoundRobinState::default()),
        );
        Ok(Self {
            options,
            ledger: Ledger::new(state),
        })
    }

    pub fn schedule(&self) -> &[ScheduledMatch] {
        match &self.state().details {
            FormatState::RoundRobin(rr) => rr.schedule.as_slice(),
            _ => &[],
        }
    }

    pub fn remaining(&self) -> usize {
        self.schedule().iter().filter(|m| m.outcome.is_none()).count()
    }
}

fn round_robin_mut(details: &mut FormatState) -> Result<&mut RoundRobinState, TournamentError> {
    match details {
        FormatState::RoundRobin(rr) => Ok(rr),
        _ => Err(TournamentError::Internal("round robin policy without a schedule")),
    }
}

/// Open the first pending fixture, or finish when none is left.
fn advance(state: &mut GameState) -> Result<(), TournamentError> {
    let next = round_robin_mut(&mut state.details)?
        .remaining()
        .next()
        .map(|m| (m.id.clone(), [m.home, m.away], m.leg));
    match next {
        Some((id, fighters, leg)) => {
            let ordinal = state.next_ordinal();
            state.current_match = Some(GameMatch::new(id, fighters, ordinal).in_round(leg));
        }
        None => finish_tournament(state),
    }
    Ok(())
}

impl SchedulingPolicy for RoundRobinPolicy {
    fn format(&self) -> FormatId {
        FormatId::RoundRobin
    }

    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    fn start(&mut self) -> Result<&GameState, TournamentError> {
        let double = self.options.double_round_robin;
        self.ledger.commit(|state| {
            start_tournament(state)?;
            let seats: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
            let schedule = generate_schedule(&seats, double);
            log::info!("round robin schedule: {} matches", schedule.len());
            round_robin_mut(&mut state.details)?.schedule = schedule;
            advance(state)
        })
    }

    /// `winner` is the reported player; with `meta.draw` the match counts as a draw.
    fn apply_result(
        &mut self,
        winner: PlayerId,
        meta: Option<ResultMeta>,
    ) -> Result<&GameState, TournamentError> {
        let points = self.options.points;
        let allow_draws = self.options.allow_draws;
        self.ledger.commit(|state| {
            let current = state
                .current_match
                .clone()
                .ok_or(TournamentError::NoCurrentMatch)?;
            let other = current
                .opponent_of(winner)
                .ok_or(TournamentError::WinnerNotInMatch(winner))?;
            let meta = meta.unwrap_or_default();
            if meta.draw && !allow_draws {
                return Err(TournamentError::InvalidScore(
                    "draws are disabled for this tournament".to_string(),
                ));
            }
            meta.check()?;

            let (scored, conceded) = meta.score.unwrap_or((0, 0));
            let reported = roster_mut(&mut state.players, winner)?;
            reported.add_goals(scored, conceded);
            if meta.draw {
                reported.add_draw(points.draw);
            } else {
                reported.add_win(points.win);
            }
            let opponent = roster_mut(&mut state.players, other)?;
            opponent.add_goals(conceded, scored);
            if meta.draw {
                opponent.add_draw(points.draw);
            } else {
                opponent.add_loss(points.loss);
            }

            let rr = round_robin_mut(&mut state.details)?;
            let fixture = rr
                .schedule
                .iter_mut()
                .find(|m| m.id == current.id)
                .ok_or(TournamentError::Internal("current match not in schedule"))?;
            let reported_home = fixture.home == winner;
            fixture.outcome = Some(Outcome {
                winner: (!meta.draw).then_some(winner),
                score: meta
                    .score
                    .map(|(a, b)| if reported_home { (a, b) } else { (b, a) }),
            });

            if meta.draw {
                let id = Some(current.id);
                state.record_event(RecordKind::Draw, id, Some(winner), Some(other));
            } else {
                state.record_win(Some(current.id), winner, other, None)?;
            }
            state.current_match = None;
            advance(state)
        })
    }

    /// Points, goal difference, goals for, wins, seat.
    fn standings(&self) -> Vec<Standing> {
        rank_players(&self.state().players, |a, b| {
            b.score
                .cmp(&a.score)
                .then(b.goal_difference().cmp(&a.goal_difference()))
                .then(b.goals_for.cmp(&a.goals_for))
                .then(b.wins.cmp(&a.wins))
        })
    }
}
