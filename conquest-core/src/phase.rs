//! Coarse game phase and its legal transitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The session's coarse phase.
///
/// Strictly forward-progressing: `Menu → Selection → Gameplay` is linear and
/// the two outcomes are terminal. Leaving a terminal phase requires an
/// external restart, which reconstructs the whole core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Menu,
    Selection,
    Gameplay,
    Victory,
    Defeat,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Victory | GamePhase::Defeat)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GamePhase::Menu => "MENU",
            GamePhase::Selection => "SELECTION",
            GamePhase::Gameplay => "GAMEPLAY",
            GamePhase::Victory => "VICTORY",
            GamePhase::Defeat => "DEFEAT",
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal phase transition {from:?} -> {to:?}")]
pub struct PhaseError {
    pub from: GamePhase,
    pub to: GamePhase,
}

/// Holds the current phase and enforces the edge set.
#[derive(Debug)]
pub struct PhaseMachine {
    current: GamePhase,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            current: GamePhase::Menu,
        }
    }

    pub fn current(&self) -> GamePhase {
        self.current
    }

    /// Move to `next` if the edge is legal; returns the phase left behind.
    pub fn transition(&mut self, next: GamePhase) -> Result<GamePhase, PhaseError> {
        use GamePhase::*;
        let legal = matches!(
            (self.current, next),
            (Menu, Selection) | (Selection, Gameplay) | (Gameplay, Victory) | (Gameplay, Defeat)
        );
        if !legal {
            return Err(PhaseError {
                from: self.current,
                to: next,
            });
        }
        let old = self.current;
        self.current = next;
        log::info!("phase {} -> {}", old.label(), next.label());
        Ok(old)
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = PhaseMachine::new();
        assert_eq!(machine.current(), GamePhase::Menu);
        assert_eq!(machine.transition(GamePhase::Selection), Ok(GamePhase::Menu));
        assert_eq!(
            machine.transition(GamePhase::Gameplay),
            Ok(GamePhase::Selection)
        );
        assert!(machine.transition(GamePhase::Victory).is_ok());
        assert!(machine.current().is_terminal());
    }

    #[test]
    fn test_rejects_skipping_selection() {
        let mut machine = PhaseMachine::new();
        let err = machine.transition(GamePhase::Gameplay).unwrap_err();
        assert_eq!(err.from, GamePhase::Menu);
        assert_eq!(err.to, GamePhase::Gameplay);
        assert_eq!(machine.current(), GamePhase::Menu);
    }

    #[test]
    fn test_terminal_phases_absorb() {
        let mut machine = PhaseMachine::new();
        machine.transition(GamePhase::Selection).unwrap();
        machine.transition(GamePhase::Gameplay).unwrap();
        machine.transition(GamePhase::Defeat).unwrap();
        for next in [
            GamePhase::Menu,
            GamePhase::Selection,
            GamePhase::Gameplay,
            GamePhase::Victory,
        ] {
            assert!(machine.transition(next).is_err());
        }
        assert_eq!(machine.current(), GamePhase::Defeat);
    }

    #[test]
    fn test_outcomes_are_exclusive() {
        // From one gameplay state only a single outcome is reachable;
        // reaching the other afterwards is rejected.
        let mut machine = PhaseMachine::new();
        machine.transition(GamePhase::Selection).unwrap();
        machine.transition(GamePhase::Gameplay).unwrap();
        machine.transition(GamePhase::Victory).unwrap();
        assert!(machine.transition(GamePhase::Defeat).is_err());
    }
}
