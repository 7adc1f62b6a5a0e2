//! Single elimination: seeded bracket, byes for odd counts, one winner.

use crate::logic::ledger::Ledger;
use crate::logic::policy::{rank_players, ResultMeta, SchedulingPolicy, Standing};
use crate::logic::registry::FormatInfo;
use crate::logic::setup::{build_roster, finish_tournament, start_tournament};
use crate::models::{
    roster_mut, Bracket, BracketMatch, FormatId, FormatState, GameMatch, GameState, Player,
    PlayerId, RecordKind, Seeding, SlotStatus, TournamentError, TournamentOptions,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Ordering;

/// Number of rounds for `n` players: `ceil(log2(n))`.
pub fn round_count(n: usize) -> u32 {
    n.max(1).next_power_of_two().trailing_zeros()
}

/// Slots in 1-based `round` for `n` players: `ceil(n / 2^round)`.
pub fn slots_in_round(n: usize, round: u32) -> usize {
    n.div_ceil(1 << round)
}

/// First-round pairs: seed 1 vs last seed, 2 vs second-last, ...; the middle seed of an odd
/// field is unpaired and gets a bye.
pub fn seeded_pairs(seeds: &[PlayerId]) -> Vec<[Option<PlayerId>; 2]> {
    let n = seeds.len();
    let mut pairs: Vec<_> = (0..n / 2)
        .map(|i| [Some(seeds[i]), Some(seeds[n - 1 - i])])
        .collect();
    if n % 2 == 1 {
        pairs.push([Some(seeds[n / 2]), None]);
    }
    pairs
}

/// Later-round pairs: winners in bracket order, neighbours meet; an odd one out gets a bye.
pub fn bracket_pairs(advancing: &[PlayerId]) -> Vec<[Option<PlayerId>; 2]> {
    advancing
        .chunks(2)
        .map(|c| [Some(c[0]), c.get(1).copied()])
        .collect()
}

#[derive(Debug)]
pub struct EliminationPolicy {
    options: TournamentOptions,
    ledger: Ledger,
}

impl EliminationPolicy {
    pub fn new<S: AsRef<str>>(
        names: &[S],
        options: TournamentOptions,
    ) -> Result<Self, TournamentError> {
        options.validate()?;
        let players = build_roster(names, &FormatInfo::of(FormatId::Elimination))?;
        let bracket = Bracket {
            seeding: options.seeding,
            ..Bracket::default()
        };
        let state = GameState::new(players, FormatState::Elimination(bracket));
        Ok(Self {
            options,
            ledger: Ledger::new(state),
        })
    }

    pub fn bracket(&self) -> Option<&Bracket> {
        match &self.state().details {
            FormatState::Elimination(b) => Some(b),
            _ => None,
        }
    }

    fn seed_order(&self, players: &[Player]) -> Vec<PlayerId> {
        let mut seeded: Vec<&Player> = players.iter().collect();
        match self.options.seeding {
            Seeding::Position => {}
            Seeding::Score => {
                seeded.sort_by(|a, b| b.score.cmp(&a.score).then(a.position.cmp(&b.position)))
            }
            Seeding::Random => match self.options.rng_seed {
                Some(seed) => seeded.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => seeded.shuffle(&mut rand::thread_rng()),
            },
        }
        seeded.into_iter().map(|p| p.id).collect()
    }
}

fn bracket_mut(details: &mut FormatState) -> Result<&mut Bracket, TournamentError> {
    match details {
        FormatState::Elimination(b) => Ok(b),
        _ => Err(TournamentError::Internal("elimination policy without a bracket")),
    }
}

/// Seat `pairs` into a round's slots. Single-player slots are settled as byes; returns
/// the (slot id, player) of each bye.
fn place(round: &mut [BracketMatch], pairs: &[[Option<PlayerId>; 2]]) -> Vec<(String, PlayerId)> {
    let mut byes = Vec::new();
    for (slot, pair) in round.iter_mut().zip(pairs) {
        slot.players = *pair;
        if let [Some(only), None] = *pair {
            slot.status = SlotStatus::Bye;
            slot.winner = Some(only);
            byes.push((slot.id.clone(), only));
        }
    }
    byes
}

/// Open the next ready slot; when the round is settled, fill the next round or finish.
fn advance(state: &mut GameState) -> Result<(), TournamentError> {
    loop {
        let bracket = bracket_mut(&mut state.details)?;
        let round_index = bracket.current_round;
        let round = bracket
            .rounds
            .get(round_index)
            .ok_or(TournamentError::Internal("bracket round out of range"))?;

        if let Some(slot) = round.iter().find(|m| m.is_ready()) {
            let (id, round_no) = (slot.id.clone(), slot.round);
            let fighters = match slot.players {
                [Some(a), Some(b)] => [a, b],
                _ => return Err(TournamentError::Internal("ready slot missing a player")),
            };
            let ordinal = state.next_ordinal();
            log::debug!("bracket match {id} (round {round_no})");
            state.current_match = Some(GameMatch::new(id, fighters, ordinal).in_round(round_no));
            return Ok(());
        }
        if !round.iter().all(BracketMatch::is_settled) {
            return Err(TournamentError::Internal("unsettled slot with no ready match"));
        }

        if round_index + 1 == bracket.rounds.len() {
            finish_tournament(state);
            return Ok(());
        }
        let advancing: Vec<PlayerId> = round.iter().filter_map(|m| m.winner).collect();
        bracket.current_round += 1;
        log::info!(
            "bracket round {} complete; {} advance",
            round_index + 1,
            advancing.len()
        );
        let byes = place(
            &mut bracket.rounds[round_index + 1],
            &bracket_pairs(&advancing),
        );
        for (slot_id, player) in byes {
            state.record_event(RecordKind::Bye, Some(slot_id), Some(player), None);
        }
    }
}

impl SchedulingPolicy for EliminationPolicy {
    fn format(&self) -> FormatId {
        FormatId::Elimination
    }

    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Seed the field, lay out every round, settle first-round byes and open the first match.
    fn start(&mut self) -> Result<&GameState, TournamentError> {
        let seeds = self.seed_order(&self.state().players);
        self.ledger.commit(|state| {
            start_tournament(state)?;
            let n = seeds.len();
            let bracket = bracket_mut(&mut state.details)?;
            bracket.seeds = seeds.clone();
            bracket.current_round = 0;
            bracket.eliminated_in.clear();
            bracket.rounds = (1..=round_count(n))
                .map(|r| {
                    (0..slots_in_round(n, r))
                        .map(|slot| BracketMatch::empty(r, slot))
                        .collect()
                })
                .collect();
            let byes = match bracket.rounds.first_mut() {
                Some(first) => place(first, &seeded_pairs(&seeds)),
                None => return Err(TournamentError::Internal("bracket has no rounds")),
            };
            for (slot_id, player) in byes {
                state.record_event(RecordKind::Bye, Some(slot_id), Some(player), None);
            }
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
            let meta = meta.unwrap_or_default();
            meta.require_winner(FormatId::Elimination)?;
            let round = current
                .round
                .ok_or(TournamentError::Internal("bracket match without a round"))?;

            let w = roster_mut(&mut state.players, winner)?;
            w.add_win(1);
            if let Some((scored, conceded)) = meta.score {
                w.add_goals(scored, conceded);
            }
            let l = roster_mut(&mut state.players, loser)?;
            l.add_loss(0);
            l.eliminate();
            if let Some((scored, conceded)) = meta.score {
                l.add_goals(conceded, scored);
            }

            let bracket = bracket_mut(&mut state.details)?;
            let slot = bracket
                .rounds
                .iter_mut()
                .flatten()
                .find(|m| m.id == current.id)
                .ok_or(TournamentError::Internal("current match not in bracket"))?;
            slot.winner = Some(winner);
            slot.loser = Some(loser);
            slot.status = SlotStatus::Completed;
            bracket.eliminated_in.insert(loser, round);

            state.record_win(Some(current.id), winner, loser, None)?;
            state.current_match = None;
            advance(state)
        })
    }

    /// Still-standing players first, then later elimination ranks higher.
    fn standings(&self) -> Vec<Standing> {
        let eliminated_in = self
            .bracket()
            .map(|b| b.eliminated_in.clone())
            .unwrap_or_default();
        rank_players(&self.state().players, |a, b| {
            match (eliminated_in.get(&a.id), eliminated_in.get(&b.id)) {
                (None, None) => b.wins.cmp(&a.wins),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(ra), Some(rb)) => rb.cmp(ra),
            }
        })
    }

    /// The last player standing.
    fn winner(&self) -> Option<&Player> {
        if !self.is_finished() {
            return None;
        }
        let mut standing = self.state().players.iter().filter(|p| !p.is_eliminated);
        match (standing.next(), standing.next()) {
            (Some(only), None) => Some(only),
            _ => {
                let top = self.standings().into_iter().next()?;
                self.state().player(top.player.id)
            }
        }
    }
}
