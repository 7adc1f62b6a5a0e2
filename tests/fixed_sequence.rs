//! Integration tests for the fixed four-player sequence and its replication.

use arena_tournament::{
    FixedSequencePolicy, PlayerId, ReplicatedResult, SchedulingPolicy, TournamentError,
    TournamentOptions,
};
use std::collections::BTreeMap;

const NAMES: [&str; 4] = ["Ann", "Bo", "Cy", "Di"];

fn started() -> FixedSequencePolicy {
    let mut t = FixedSequencePolicy::new(&NAMES, TournamentOptions::default()).unwrap();
    t.start().unwrap();
    t
}

fn last_result(t: &FixedSequencePolicy) -> ReplicatedResult {
    t.completed_matches().last().cloned().unwrap()
}

#[test]
fn plays_the_six_pairings_in_order() {
    let mut t = started();
    let mut patterns = Vec::new();
    let mut played: Vec<[PlayerId; 2]> = Vec::new();
    while let Some(m) = t.next_match() {
        patterns.push(m.pattern.clone().unwrap());
        played.push(m.fighters);
        t.apply_result(m.fighters[0], None).unwrap();
    }
    assert_eq!(patterns, ["AB", "CD", "CA", "BD", "BC", "AD"]);
    assert!(t.is_finished());
    assert_eq!(t.completed_matches().len(), 6);

    let mut per_pair = BTreeMap::new();
    let mut per_player = BTreeMap::new();
    for [a, b] in &played {
        *per_pair.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        *per_player.entry(*a).or_insert(0) += 1;
        *per_player.entry(*b).or_insert(0) += 1;
    }
    assert_eq!(per_pair.len(), 6);
    assert!(per_pair.values().all(|&n| n == 1));
    assert!(per_player.values().all(|&n| n == 3));

    // nobody plays three in a row, and no pairing repeats back to back
    for w in played.windows(3) {
        for p in t.players() {
            assert!(!w.iter().all(|m| m.contains(&p.id)), "{} played three straight", p.name);
        }
    }
    for w in played.windows(2) {
        let (x, y) = (w[0], w[1]);
        assert!(!(x.contains(&y[0]) && x.contains(&y[1])));
    }
}

#[test]
fn results_carry_their_sequence_index() {
    let mut t = started();
    let c = t.players()[2].id;
    let a = t.players()[0].id;
    t.apply_result(a, None).unwrap(); // AB
    t.apply_result(c, None).unwrap(); // CD
    let second = last_result(&t);
    assert_eq!(second.sequence_index, Some(1));
    assert_eq!(second.match_id, "SEQ2");
    assert_eq!(second.winner_name, "Cy");
    assert_eq!(t.sequence().unwrap().index, 2);
    assert_eq!(t.current_match().unwrap().fighters, [c, a]);
}

#[test]
fn replicated_result_applies_once() {
    let mut origin = started();
    let mut mirror = FixedSequencePolicy::new(&NAMES, TournamentOptions::default()).unwrap();
    assert!(mirror.load_snapshot(origin.snapshot()).unwrap());

    let winner = origin.current_match().unwrap().fighters[1];
    origin.apply_result(winner, None).unwrap();
    let result = last_result(&origin);

    assert!(mirror.apply_replicated(&result).unwrap());
    assert!(!mirror.apply_replicated(&result).unwrap());
    assert_eq!(mirror.completed_matches().len(), 1);
    assert_eq!(mirror.state().player(winner).unwrap().score, 1);
    assert_eq!(
        mirror.current_match().map(|m| m.id.clone()),
        origin.current_match().map(|m| m.id.clone())
    );

    // the originating device ignores its own echo
    assert!(!origin.apply_replicated(&result).unwrap());
    assert_eq!(origin.completed_matches().len(), 1);
}

#[test]
fn out_of_order_results_are_ignored() {
    let mut t = started();
    let a = t.players()[0].id;
    let d = t.players()[3].id;
    let ahead = ReplicatedResult {
        sequence_index: Some(5),
        match_id: "SEQ6".to_string(),
        winner_id: a,
        loser_id: d,
        winner_name: "Ann".to_string(),
        loser_name: "Di".to_string(),
        timestamp: chrono::Utc::now(),
    };
    let version = t.version();
    assert!(!t.apply_replicated(&ahead).unwrap());
    assert_eq!(t.version(), version);
    assert!(t.completed_matches().is_empty());
}

#[test]
fn relayed_result_must_name_both_fighters() {
    let mut t = started();
    let [a, _, c, _] = [0, 1, 2, 3].map(|i| t.players()[i].id);
    let wrong_loser = ReplicatedResult {
        sequence_index: Some(0),
        match_id: "SEQ1".to_string(),
        winner_id: a,
        loser_id: c,
        winner_name: "Ann".to_string(),
        loser_name: "Cy".to_string(),
        timestamp: chrono::Utc::now(),
    };
    let version = t.version();
    assert!(!t.apply_replicated(&wrong_loser).unwrap());
    assert_eq!(t.version(), version);
    assert!(t.completed_matches().is_empty());
    assert_eq!(t.current_match().unwrap().id, "SEQ1");
}

#[test]
fn roster_must_be_four_distinct_names() {
    assert!(matches!(
        FixedSequencePolicy::new(&["Ann", "Bo", "ann", "Di"], TournamentOptions::default()),
        Err(TournamentError::DuplicatePlayerName(_))
    ));
    assert!(matches!(
        FixedSequencePolicy::new(&["Ann", "Bo", "Cy"], TournamentOptions::default()),
        Err(TournamentError::PlayerCount { found: 3, .. })
    ));
}

#[test]
fn standings_count_wins() {
    let mut t = started();
    let p: Vec<PlayerId> = t.players().iter().map(|p| p.id).collect();
    // AB: B, CD: C, CA: C, BD: B, BC: C, AD: D
    for winner in [p[1], p[2], p[2], p[1], p[2], p[3]] {
        t.apply_result(winner, None).unwrap();
    }
    let order: Vec<PlayerId> = t.standings().iter().map(|s| s.player.id).collect();
    assert_eq!(order, vec![p[2], p[1], p[3], p[0]]);
    assert_eq!(t.winner().unwrap().id, p[2]);
}
