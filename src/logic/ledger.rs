//! Shared commit machinery for every format.
//!
//! Changes run against a copy of the state and replace it only on success, so a failed
//! operation leaves state, version and undo stack untouched. Each accepted change pushes the
//! prior state for undo, bumps the version and hands a snapshot to the publisher.

use crate::logic::undo::UndoStack;
use crate::models::{GameState, TournamentError, TournamentSnapshot};
use std::fmt;

/// Callback that receives a snapshot after every accepted change.
/// The host decides whether and when to persist it; the engine never waits on it.
pub type Publisher = Box<dyn FnMut(&TournamentSnapshot) + Send>;

pub struct Ledger {
    state: GameState,
    undo: UndoStack<GameState>,
    version: u64,
    publisher: Option<Publisher>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("state", &self.state)
            .field("undo_depth", &self.undo.len())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            undo: UndoStack::new(),
            version: 0,
            publisher: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn set_publisher(&mut self, publisher: Publisher) {
        self.publisher = Some(publisher);
    }

    /// Apply `change` atomically: validate and mutate a copy, then swap it in.
    pub fn commit<F>(&mut self, change: F) -> Result<&GameState, TournamentError>
    where
        F: FnOnce(&mut GameState) -> Result<(), TournamentError>,
    {
        let mut next = self.state.clone();
        change(&mut next)?;
        let prev = std::mem::replace(&mut self.state, next);
        self.undo.push(prev);
        self.version += 1;
        self.publish();
        Ok(&self.state)
    }

    /// Restore the state before the latest change.
    pub fn undo(&mut self) -> Result<&GameState, TournamentError> {
        let prev = self.undo.pop().ok_or(TournamentError::NoHistory)?;
        self.state = prev;
        self.version += 1;
        log::debug!(
            "tournament {}: undo to v{} ({} left)",
            self.state.id,
            self.version,
            self.undo.len()
        );
        self.publish();
        Ok(&self.state)
    }

    pub fn snapshot(&self) -> TournamentSnapshot {
        TournamentSnapshot {
            version: self.version,
            state: self.state.clone(),
            undo_stack: self.undo.as_slice().to_vec(),
        }
    }

    /// Replace everything with a remote snapshot if it is newer than what we have.
    ///
    /// Returns `Ok(false)` for a stale snapshot (version not above ours); that is not an error.
    pub fn load(&mut self, snapshot: TournamentSnapshot) -> Result<bool, TournamentError> {
        let expected = self.state.format();
        let found = snapshot.state.format();
        if expected != found {
            log::warn!("rejected {found} snapshot for {expected} tournament");
            return Err(TournamentError::SnapshotFormatMismatch { expected, found });
        }
        if snapshot.version <= self.version {
            log::debug!(
                "ignored stale snapshot v{} (local v{})",
                snapshot.version,
                self.version
            );
            return Ok(false);
        }
        log::info!(
            "tournament {}: applied remote snapshot v{} over v{}",
            snapshot.state.id,
            snapshot.version,
            self.version
        );
        self.state = snapshot.state;
        self.undo = UndoStack::from_vec(snapshot.undo_stack);
        self.version = snapshot.version;
        Ok(true)
    }

    fn publish(&mut self) {
        if self.publisher.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(publish) = self.publisher.as_mut() {
            publish(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormatState, Phase, Player, SequenceState, StreakState};
    use std::sync::{Arc, Mutex};

    fn ledger() -> Ledger {
        let players = vec![Player::new("a", 0), Player::new("b", 1)];
        Ledger::new(GameState::new(
            players,
            FormatState::Streak(StreakState::default()),
        ))
    }

    #[test]
    fn failed_commit_changes_nothing() {
        let mut l = ledger();
        let before = l.snapshot();
        let res = l.commit(|s| {
            s.phase = Phase::Playing;
            Err(TournamentError::NoCurrentMatch)
        });
        assert!(res.is_err());
        assert_eq!(l.snapshot(), before);
    }

    #[test]
    fn commit_then_undo_restores_state_and_bumps_version() {
        let mut l = ledger();
        let original = l.state().clone();
        l.commit(|s| {
            s.phase = Phase::Playing;
            Ok(())
        })
        .unwrap();
        assert_eq!(l.version(), 1);
        assert_eq!(l.undo_depth(), 1);
        l.undo().unwrap();
        assert_eq!(l.state(), &original);
        assert_eq!(l.version(), 2);
        assert!(matches!(l.undo(), Err(TournamentError::NoHistory)));
    }

    #[test]
    fn publisher_sees_every_accepted_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut l = ledger();
        l.set_publisher(Box::new(move |snap: &TournamentSnapshot| {
            sink.lock().unwrap().push(snap.version)
        }));
        l.commit(|_| Ok(())).unwrap();
        let _ = l.commit(|_| Err(TournamentError::NoCurrentMatch));
        l.undo().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn load_rejects_stale_and_foreign_snapshots() {
        let mut l = ledger();
        l.commit(|_| Ok(())).unwrap();
        let stale = l.snapshot();
        assert!(!l.load(stale.clone()).unwrap());

        let mut newer = stale.clone();
        newer.version = 5;
        newer.state.phase = Phase::Finished;
        assert!(l.load(newer).unwrap());
        assert_eq!(l.version(), 5);
        assert_eq!(l.state().phase, Phase::Finished);

        let mut foreign = l.snapshot();
        foreign.version = 9;
        foreign.state.details = FormatState::FixedSequence(SequenceState::default());
        assert!(matches!(
            l.load(foreign),
            Err(TournamentError::SnapshotFormatMismatch { .. })
        ));
    }
}
