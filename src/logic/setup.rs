//! Setup phase: roster validation, start (Setup -> Playing) and finish.

use crate::logic::registry::FormatInfo;
use crate::models::{FormatState, GameState, Phase, Player, TournamentError};

/// Validate names against the format's rules and seat the players in the given order.
///
/// Names are trimmed. Empty names are always rejected; duplicates (case-insensitive) only
/// where the format requires unique names. Nothing is created on failure.
pub fn build_roster<S: AsRef<str>>(
    names: &[S],
    info: &FormatInfo,
) -> Result<Vec<Player>, TournamentError> {
    if !info.accepts(names.len()) {
        return Err(TournamentError::PlayerCount {
            format: info.id,
            min: info.min_players,
            max: info.max_players,
            found: names.len(),
        });
    }
    let mut players: Vec<Player> = Vec::with_capacity(names.len());
    for (position, name) in names.iter().enumerate() {
        let name_trimmed = name.as_ref().trim();
        if name_trimmed.is_empty() {
            return Err(TournamentError::EmptyName);
        }
        let is_duplicate = players
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name_trimmed));
        if info.requires_unique_names && is_duplicate {
            return Err(TournamentError::DuplicatePlayerName(name_trimmed.to_string()));
        }
        players.push(Player::new(name_trimmed, position));
    }
    Ok(players)
}

/// Start the tournament: Setup -> Playing. The format picks the first match afterwards.
pub fn start_tournament(state: &mut GameState) -> Result<(), TournamentError> {
    state.require_phase(Phase::Setup)?;
    state.phase = Phase::Playing;
    log::info!(
        "tournament {} ({}) started with {} players",
        state.id,
        state.format(),
        state.players.len()
    );
    Ok(())
}

/// Finish: no current match, no pending side decision, standings final.
pub fn finish_tournament(state: &mut GameState) {
    state.phase = Phase::Finished;
    state.current_match = None;
    if let FormatState::Streak(streak) = &mut state.details {
        streak.show_rest_option = false;
    }
    log::info!("tournament {} finished", state.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormatId;

    #[test]
    fn roster_is_seated_in_order_with_labels() {
        let players = build_roster(&["bob", " jimmy ", "white"], &FormatInfo::of(FormatId::Streak))
            .unwrap();
        let names: Vec<_> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["bob", "jimmy", "white"]);
        assert_eq!(players[2].position, 2);
        assert_eq!(players[2].label, "C");
    }

    #[test]
    fn duplicate_names_only_rejected_where_required() {
        let names = ["Ann", "ann", "Bo", "Cy"];
        assert!(build_roster(&names, &FormatInfo::of(FormatId::RoundRobin)).is_ok());
        assert!(matches!(
            build_roster(&names, &FormatInfo::of(FormatId::FixedSequence)),
            Err(TournamentError::DuplicatePlayerName(n)) if n == "ann"
        ));
    }

    #[test]
    fn empty_names_and_bad_counts_are_rejected() {
        let info = FormatInfo::of(FormatId::Streak);
        assert!(matches!(
            build_roster(&["a", "  ", "c"], &info),
            Err(TournamentError::EmptyName)
        ));
        assert!(matches!(
            build_roster(&["a", "b"], &info),
            Err(TournamentError::PlayerCount { found: 2, .. })
        ));
    }
}
