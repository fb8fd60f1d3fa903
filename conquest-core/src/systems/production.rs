//! Periodic troop production.
//!
//! Every production tick each side's territories all gain the same amount,
//! scaled by how much that side holds:
//!
//! ```text
//! per_territory = base + floor(owned_count × bonus)
//! ```
//!
//! The two sides are computed independently, so a sprawling empire snowballs
//! while a single holdout territory trickles along.

use crate::directory::TerritoryDirectory;
use crate::territory::{Owner, TerritoryId};

/// What one production tick handed out, for logging and event reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionGrant {
    pub player_territories: usize,
    pub player_per_territory: u32,
    pub ai_territories: usize,
    pub ai_per_territory: u32,
}

/// Grant production to every player- and AI-owned territory.
pub fn run_production_tick(
    directory: &mut TerritoryDirectory,
    base: u32,
    bonus: f64,
) -> ProductionGrant {
    let player = grant_side(directory, Owner::Player, base, bonus);
    let ai = grant_side(directory, Owner::Ai, base, bonus);
    let grant = ProductionGrant {
        player_territories: player.0,
        player_per_territory: player.1,
        ai_territories: ai.0,
        ai_per_territory: ai.1,
    };
    log::debug!(
        "production: player {}x{}, ai {}x{}",
        grant.player_territories,
        grant.player_per_territory,
        grant.ai_territories,
        grant.ai_per_territory
    );
    grant
}

fn grant_side(
    directory: &mut TerritoryDirectory,
    owner: Owner,
    base: u32,
    bonus: f64,
) -> (usize, u32) {
    let ids: Vec<TerritoryId> = directory
        .by_owner(owner)
        .iter()
        .map(|t| t.id.clone())
        .collect();
    let per_territory = base + (ids.len() as f64 * bonus).floor() as u32;
    for id in &ids {
        if let Some(t) = directory.get_mut(id) {
            t.add_troops(per_territory);
        }
    }
    (ids.len(), per_territory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GameBuilder;

    #[test]
    fn test_grant_scales_with_holdings() {
        // 3 player territories, base 2, bonus 0.5: each gains 2 + floor(1.5) = 3.
        let (mut dir, _) = GameBuilder::new()
            .territory("p1", 0.0, 0.0, Owner::Player, 10)
            .territory("p2", 100.0, 0.0, Owner::Player, 10)
            .territory("p3", 200.0, 0.0, Owner::Player, 10)
            .territory("a1", 300.0, 0.0, Owner::Ai, 10)
            .build_parts();
        let grant = run_production_tick(&mut dir, 2, 0.5);
        assert_eq!(grant.player_territories, 3);
        assert_eq!(grant.player_per_territory, 3);
        assert_eq!(grant.ai_territories, 1);
        assert_eq!(grant.ai_per_territory, 2);
        for id in ["p1", "p2", "p3"] {
            assert_eq!(dir.get(&id.into()).unwrap().troops, 13);
        }
        assert_eq!(dir.get(&"a1".into()).unwrap().troops, 12);
    }

    #[test]
    fn test_neutral_territories_produce_nothing() {
        let (mut dir, _) = GameBuilder::new()
            .territory("n1", 0.0, 0.0, Owner::Neutral, 10)
            .build_parts();
        let grant = run_production_tick(&mut dir, 2, 0.5);
        assert_eq!(grant.player_territories, 0);
        assert_eq!(grant.ai_territories, 0);
        assert_eq!(dir.get(&"n1".into()).unwrap().troops, 10);
    }
}
