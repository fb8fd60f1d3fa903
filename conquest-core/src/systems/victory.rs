//! Win/lose evaluation.

use crate::directory::TerritoryDirectory;
use crate::phase::GamePhase;
use crate::territory::Owner;

/// Check the board for an outcome: the player owning everything is a
/// victory, owning nothing is a defeat. The two are mutually exclusive on a
/// non-empty map, and an empty map yields neither.
pub fn evaluate_outcome(directory: &TerritoryDirectory) -> Option<GamePhase> {
    let total = directory.len();
    if total == 0 {
        return None;
    }
    let player = directory.count_owned(Owner::Player);
    if player == total {
        Some(GamePhase::Victory)
    } else if player == 0 {
        Some(GamePhase::Defeat)
    } else {
        None
    }
}
