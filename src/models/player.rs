//! Player and PlayerStats data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches and lookups).
pub type PlayerId = Uuid;

/// Statistics view of a player (for API / display).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub score: u32,
    pub win_streak: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub goal_difference: i64,
    pub resting: bool,
    pub eliminated: bool,
}

impl PlayerStats {
    pub fn from_player(p: &Player) -> Self {
        Self {
            score: p.score,
            win_streak: p.win_streak,
            wins: p.wins,
            losses: p.losses,
            draws: p.draws,
            goal_difference: p.goal_difference(),
            resting: p.is_resting,
            eliminated: p.is_eliminated,
        }
    }
}

/// A competitor within one tournament.
///
/// Identity is always `id`; names are display labels and may repeat unless the format says otherwise.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Seat order from setup. Immutable; the last tie-break in every format.
    pub position: usize,
    /// Seat label (`A`, `B`, ...) used to spell fixed schedules.
    pub label: String,
    /// Accumulated points. Never decreases except through undo.
    pub score: u32,
    /// Consecutive wins since the last loss or rest.
    pub win_streak: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Streak format: temporarily out of rotation.
    pub is_resting: bool,
    /// Elimination format: permanently out.
    pub is_eliminated: bool,
}

impl Player {
    /// Create a player at the given seat. Stats start at zero.
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            position,
            label: seat_label(position),
            score: 0,
            win_streak: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            goals_for: 0,
            goals_against: 0,
            is_resting: false,
            is_eliminated: false,
        }
    }

    /// Current stats as a separate struct (for API responses).
    pub fn stats(&self) -> PlayerStats {
        PlayerStats::from_player(self)
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    /// Record a win worth `points`; extends the current run.
    pub fn add_win(&mut self, points: u32) {
        self.wins += 1;
        self.win_streak += 1;
        self.score += points;
    }

    /// Record a loss worth `points` (usually zero); ends the current run.
    pub fn add_loss(&mut self, points: u32) {
        self.losses += 1;
        self.win_streak = 0;
        self.score += points;
    }

    /// Record a draw worth `points`; a draw also ends the run of wins.
    pub fn add_draw(&mut self, points: u32) {
        self.draws += 1;
        self.win_streak = 0;
        self.score += points;
    }

    pub fn add_goals(&mut self, scored: u32, conceded: u32) {
        self.goals_for += scored;
        self.goals_against += conceded;
    }

    /// Leave the rotation, collecting `bonus` points for the completed run.
    pub fn take_rest(&mut self, bonus: u32) {
        self.score += bonus;
        self.win_streak = 0;
        self.is_resting = true;
    }

    /// Mark the player as eliminated.
    pub fn eliminate(&mut self) {
        self.is_eliminated = true;
    }
}

/// Seat label for a zero-based position: `A`..`Z`, then `A1`, `B1`, ...
pub fn seat_label(position: usize) -> String {
    let letter = char::from(b'A' + (position % 26) as u8);
    match position / 26 {
        0 => letter.to_string(),
        lap => format!("{letter}{lap}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_seat_order() {
        assert_eq!(seat_label(0), "A");
        assert_eq!(seat_label(3), "D");
        assert_eq!(seat_label(27), "B1");
    }

    #[test]
    fn loss_resets_streak_but_keeps_score() {
        let mut p = Player::new("bob", 0);
        p.add_win(1);
        p.add_win(1);
        p.add_loss(0);
        assert_eq!(p.score, 2);
        assert_eq!(p.win_streak, 0);
        assert_eq!((p.wins, p.losses), (2, 1));
    }
}
