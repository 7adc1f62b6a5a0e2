//! Undo and atomicity across every format.

use arena_tournament::{
    FormatId, GameState, PolicyManager, SchedulingPolicy, TournamentError, TournamentOptions,
};
use proptest::prelude::*;
use uuid::Uuid;

fn roster(format: FormatId) -> Vec<&'static str> {
    let all = ["Ann", "Bo", "Cy", "Di", "Ed", "Flo"];
    let n = match format {
        FormatId::Streak => 5,
        FormatId::Elimination => 6,
        FormatId::RoundRobin | FormatId::FixedSequence => 4,
    };
    all[..n].to_vec()
}

fn started(format: FormatId) -> Box<dyn SchedulingPolicy> {
    let manager = PolicyManager::new(TournamentOptions::default());
    let mut t = manager.create(format, &roster(format), None).unwrap();
    t.start().unwrap();
    t
}

/// One forward step: play the current match, or answer a pending rest decision.
fn step(t: &mut dyn SchedulingPolicy, pick: u8) -> Result<(), TournamentError> {
    match t.next_match() {
        Some(m) => t.apply_result(m.fighters[usize::from(pick % 2)], None).map(|_| ()),
        None if pick % 2 == 0 => t.take_rest().map(|_| ()),
        None => t.continue_play().map(|_| ()),
    }
}

#[test]
fn undo_without_history_is_an_error() {
    let manager = PolicyManager::default();
    let mut t = manager
        .create(FormatId::RoundRobin, &["a", "b", "c"], None)
        .unwrap();
    assert!(!t.can_undo());
    assert!(matches!(t.undo(), Err(TournamentError::NoHistory)));
    assert_eq!(t.version(), 0);
}

#[test]
fn undo_walks_back_to_setup() {
    for format in FormatId::ALL {
        let mut t = started(format);
        let mut trail: Vec<GameState> = vec![t.state().clone()];
        for pick in [0u8, 1, 1, 0] {
            step(t.as_mut(), pick).unwrap();
            trail.push(t.state().clone());
        }
        trail.pop();
        while let Some(expected) = trail.pop() {
            t.undo().unwrap();
            assert_eq!(t.state(), &expected, "{format}");
        }
        t.undo().unwrap();
        assert_eq!(t.state().phase, arena_tournament::Phase::Setup, "{format}");
        assert!(t.current_match().is_none());
        assert!(!t.can_undo());
    }
}

#[test]
fn undo_reverts_a_rest() {
    let mut t = started(FormatId::Streak);
    let champion = t.current_match().unwrap().fighters[0];
    for _ in 0..4 {
        t.apply_result(champion, None).unwrap();
    }
    let pending = t.state().clone();
    t.take_rest().unwrap();
    assert!(t.state().player(champion).unwrap().is_resting);
    t.undo().unwrap();
    assert_eq!(t.state(), &pending);
    assert!(t.next_match().is_none());
}

#[test]
fn undo_reopens_a_finished_tournament() {
    let mut t = started(FormatId::Elimination);
    while let Some(m) = t.next_match() {
        t.apply_result(m.fighters[0], None).unwrap();
    }
    assert!(t.is_finished());
    t.undo().unwrap();
    assert!(!t.is_finished());
    assert!(t.next_match().is_some());
}

#[test]
fn stranger_as_winner_changes_nothing() {
    for format in FormatId::ALL {
        let mut t = started(format);
        let before = t.snapshot();
        let stranger = Uuid::new_v4();
        assert!(
            matches!(
                t.apply_result(stranger, None),
                Err(TournamentError::WinnerNotInMatch(id)) if id == stranger
            ),
            "{format}"
        );
        assert_eq!(t.snapshot(), before, "{format}");
    }
}

#[test]
fn nothing_to_play_before_start() {
    let manager = PolicyManager::default();
    for format in FormatId::ALL {
        let mut t = manager.create(format, &roster(format), None).unwrap();
        assert!(t.next_match().is_none());
        let anyone = t.players()[0].id;
        assert!(matches!(
            t.apply_result(anyone, None),
            Err(TournamentError::NoCurrentMatch)
        ));
        t.start().unwrap();
        assert!(matches!(
            t.start(),
            Err(TournamentError::InvalidPhase { .. })
        ));
    }
}

proptest! {
    /// Every forward step is exactly reversed by one undo, and scores never go down.
    #[test]
    fn undo_is_the_inverse_of_every_step(
        format_index in 0usize..4,
        picks in proptest::collection::vec(any::<u8>(), 1..40),
    ) {
        let format = FormatId::ALL[format_index];
        let mut t = started(format);
        for pick in picks {
            if t.is_finished() {
                break;
            }
            let before = t.state().clone();
            let scores: Vec<u32> = before.players.iter().map(|p| p.score).collect();

            step(t.as_mut(), pick).unwrap();
            for (p, old) in t.players().iter().zip(&scores) {
                prop_assert!(p.score >= *old);
            }
            let version = t.version();
            t.undo().unwrap();
            prop_assert_eq!(t.state(), &before);
            prop_assert_eq!(t.version(), version + 1);

            step(t.as_mut(), pick).unwrap();
        }
    }
}
