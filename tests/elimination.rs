//! Integration tests for the single-elimination bracket.

use arena_tournament::{
    round_count, EliminationPolicy, PlayerId, RecordKind, ResultMeta, SchedulingPolicy, Seeding,
    SlotStatus, TournamentError, TournamentOptions,
};
use proptest::prelude::*;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("P{i}")).collect()
}

fn started(n: usize) -> EliminationPolicy {
    let mut t = EliminationPolicy::new(&names(n), TournamentOptions::default()).unwrap();
    t.start().unwrap();
    t
}

fn seat(t: &EliminationPolicy, position: usize) -> PlayerId {
    t.players()[position].id
}

#[test]
fn five_players_bye_then_final() {
    let mut t = started(5);
    let p: Vec<PlayerId> = (0..5).map(|i| seat(&t, i)).collect();

    let bye = &t.history()[0];
    assert_eq!(bye.kind, RecordKind::Bye);
    assert_eq!(bye.winner_id, Some(p[2]));
    assert_eq!(bye.match_id.as_deref(), Some("R1-M3"));

    let first = t.current_match().unwrap();
    assert_eq!((first.id.as_str(), first.fighters), ("R1-M1", [p[0], p[4]]));
    t.apply_result(p[0], None).unwrap();
    assert_eq!(t.current_match().unwrap().fighters, [p[1], p[3]]);
    t.apply_result(p[1], None).unwrap();

    // three advance: seeds 1 and 2 meet, seed 3 gets a second bye
    let bracket = t.bracket().unwrap();
    assert_eq!(bracket.current_round, 1);
    assert_eq!(bracket.rounds[1][1].status, SlotStatus::Bye);
    assert_eq!(t.current_match().unwrap().id, "R2-M1");
    t.apply_result(p[0], None).unwrap();

    let last = t.current_match().unwrap();
    assert_eq!((last.id.as_str(), last.fighters), ("R3-M1", [p[0], p[2]]));
    t.apply_result(p[2], None).unwrap();

    assert!(t.is_finished());
    assert_eq!(t.winner().unwrap().id, p[2]);
    let order: Vec<PlayerId> = t.standings().iter().map(|s| s.player.id).collect();
    assert_eq!(order, vec![p[2], p[0], p[1], p[3], p[4]]);
    assert_eq!(t.players().iter().filter(|x| x.is_eliminated).count(), 4);
}

#[test]
fn two_players_play_a_single_final() {
    let mut t = started(2);
    let (a, b) = (seat(&t, 0), seat(&t, 1));
    assert_eq!(t.bracket().unwrap().rounds.len(), 1);
    t.apply_result(b, None).unwrap();
    assert!(t.is_finished());
    assert_eq!(t.winner().unwrap().id, b);
    assert!(t.state().player(a).unwrap().is_eliminated);
    assert!(t.next_match().is_none());
}

#[test]
fn results_must_name_a_fighter_and_have_a_winner() {
    let mut t = started(4);
    let outsider = seat(&t, 1);
    let top = seat(&t, 0);
    let before = t.snapshot();

    assert!(matches!(
        t.apply_result(outsider, None),
        Err(TournamentError::WinnerNotInMatch(id)) if id == outsider
    ));
    assert!(matches!(
        t.apply_result(top, Some(ResultMeta::draw())),
        Err(TournamentError::InvalidScore(_))
    ));
    assert!(matches!(
        t.apply_result(top, Some(ResultMeta::score(1, 3))),
        Err(TournamentError::InvalidScore(_))
    ));
    assert_eq!(t.snapshot(), before);

    t.apply_result(top, Some(ResultMeta::score(3, 1))).unwrap();
    let winner = t.state().player(top).unwrap();
    assert_eq!((winner.goals_for, winner.goals_against), (3, 1));
}

#[test]
fn rest_decisions_do_not_exist_in_brackets() {
    let mut t = started(4);
    assert!(matches!(
        t.take_rest(),
        Err(TournamentError::Unsupported { action: "take_rest", .. })
    ));
    assert!(matches!(
        t.continue_play(),
        Err(TournamentError::Unsupported { action: "continue_play", .. })
    ));
}

#[test]
fn seeded_random_draw_is_reproducible() {
    let opts = TournamentOptions {
        seeding: Seeding::Random,
        rng_seed: Some(42),
        ..TournamentOptions::default()
    };
    let seed_positions = |t: &EliminationPolicy| -> Vec<usize> {
        t.bracket()
            .unwrap()
            .seeds
            .iter()
            .map(|id| t.state().player(*id).unwrap().position)
            .collect()
    };
    let mut first = EliminationPolicy::new(&names(8), opts.clone()).unwrap();
    let mut second = EliminationPolicy::new(&names(8), opts).unwrap();
    first.start().unwrap();
    second.start().unwrap();
    assert_eq!(seed_positions(&first), seed_positions(&second));

    let mut sorted = seed_positions(&first);
    sorted.sort_unstable();
    assert_eq!(sorted, (0..8).collect::<Vec<_>>());
}

#[test]
fn score_seeding_puts_the_best_record_on_top() {
    let opts = TournamentOptions {
        seeding: Seeding::Score,
        ..TournamentOptions::default()
    };
    let mut t = EliminationPolicy::new(&names(4), opts).unwrap();

    // a roster carried over from an earlier stage, still in setup
    let mut carried = t.snapshot();
    for (player, score) in carried.state.players.iter_mut().zip([0, 5, 2, 5]) {
        player.score = score;
    }
    carried.version = 1;
    assert!(t.load_snapshot(carried).unwrap());
    t.start().unwrap();

    let p: Vec<PlayerId> = (0..4).map(|i| seat(&t, i)).collect();
    // ties on score keep seat order
    assert_eq!(t.bracket().unwrap().seeds, vec![p[1], p[3], p[2], p[0]]);
    assert_eq!(t.current_match().unwrap().fighters, [p[1], p[0]]);
}

#[test]
fn field_size_outside_range_is_rejected() {
    assert!(matches!(
        EliminationPolicy::new(&names(1), TournamentOptions::default()),
        Err(TournamentError::PlayerCount { found: 1, .. })
    ));
    assert!(matches!(
        EliminationPolicy::new(&names(33), TournamentOptions::default()),
        Err(TournamentError::PlayerCount { found: 33, .. })
    ));
}

proptest! {
    /// Any field from 2 to 32, any results: exactly one player left, n - 1 matches played.
    #[test]
    fn bracket_always_ends_with_one_winner(
        n in 2usize..=32,
        picks in proptest::collection::vec(any::<bool>(), 31),
    ) {
        let mut t = started(n);
        let mut played = 0;
        while let Some(m) = t.next_match() {
            let winner = m.fighters[usize::from(picks[played])];
            t.apply_result(winner, None).unwrap();
            played += 1;
        }
        prop_assert!(t.is_finished());
        prop_assert_eq!(played, n - 1);
        prop_assert_eq!(t.bracket().unwrap().rounds.len(), round_count(n) as usize);

        let standing: Vec<PlayerId> = t
            .players()
            .iter()
            .filter(|p| !p.is_eliminated)
            .map(|p| p.id)
            .collect();
        prop_assert_eq!(standing.len(), 1);
        prop_assert_eq!(t.winner().map(|p| p.id), Some(standing[0]));
    }
}
