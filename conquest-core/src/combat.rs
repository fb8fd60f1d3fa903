//! Attack validation and resolution.
//!
//! The resolver is stateless per attack apart from two things it owns: the
//! RNG driving the power rolls and the transient attack events kept for
//! visualization. Troop cost scales with centroid distance so distant raids
//! are expensive without modeling real logistics.

use crate::config::GameConfig;
use crate::directory::TerritoryDirectory;
use crate::geometry::Point;
use crate::territory::{Owner, TerritoryId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttackError {
    #[error("territory {0} does not exist")]
    UnknownTerritory(TerritoryId),
    #[error("attacker and defender share an owner")]
    SameOwner,
    #[error("not enough troops for this distance: required {required}, available {available}")]
    InsufficientTroops { required: u32, available: u32 },
    #[error("invalid troop count: committing {committed} of a garrison of {garrison}")]
    InvalidTroopCount { committed: u32, garrison: u32 },
}

/// Transient visual record of a resolved attack. Not gameplay state: pruned
/// by age on every [`CombatResolver::active_attacks`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackEvent {
    pub from: Point,
    pub to: Point,
    pub started_at_ms: u64,
    pub duration_ms: u64,
    pub victory: bool,
}

/// Structured outcome of one resolved attack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackReport {
    pub attacker: TerritoryId,
    pub defender: TerritoryId,
    pub attacker_name: String,
    pub defender_name: String,
    pub attacker_owner: Owner,
    /// Defender's owner before any capture.
    pub defender_owner: Owner,
    pub troops_committed: u32,
    pub attack_power: f64,
    pub defense_power: f64,
    pub victory: bool,
    pub attacker_losses: u32,
    pub defender_losses: u32,
}

/// Validates and executes attacks between territories.
pub struct CombatResolver {
    config: GameConfig,
    rng: StdRng,
    events: Vec<AttackEvent>,
    reports: Vec<AttackReport>,
}

impl CombatResolver {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Troop cost of an attack, linear in centroid distance.
    ///
    /// # Formula
    /// ```text
    /// cost = ceil(min_cost + min(distance / max_map_distance, 1) · (max_cost − min_cost))
    /// ```
    /// Zero distance costs the minimum (1); anything at or beyond a full
    /// longitude span costs the maximum (10).
    pub fn required_troops(
        &self,
        directory: &TerritoryDirectory,
        attacker: &TerritoryId,
        defender: &TerritoryId,
    ) -> Result<u32, AttackError> {
        let a = directory
            .get(attacker)
            .ok_or_else(|| AttackError::UnknownTerritory(attacker.clone()))?;
        let d = directory
            .get(defender)
            .ok_or_else(|| AttackError::UnknownTerritory(defender.clone()))?;
        Ok(self.cost_between(&a.centroid, &d.centroid))
    }

    fn cost_between(&self, from: &Point, to: &Point) -> u32 {
        let distance_factor = (from.distance(to) / self.config.max_map_distance).min(1.0);
        let span = (self.config.max_attack_cost - self.config.min_attack_cost) as f64;
        (self.config.min_attack_cost as f64 + distance_factor * span).ceil() as u32
    }

    /// Check whether an attack is currently legal. Returns the troop cost on
    /// success so callers don't compute it twice.
    pub fn can_attack(
        &self,
        directory: &TerritoryDirectory,
        attacker: &TerritoryId,
        defender: &TerritoryId,
    ) -> Result<u32, AttackError> {
        let a = directory
            .get(attacker)
            .ok_or_else(|| AttackError::UnknownTerritory(attacker.clone()))?;
        let d = directory
            .get(defender)
            .ok_or_else(|| AttackError::UnknownTerritory(defender.clone()))?;
        if a.owner == d.owner {
            return Err(AttackError::SameOwner);
        }
        let required = self.cost_between(&a.centroid, &d.centroid);
        if a.troops <= required {
            return Err(AttackError::InsufficientTroops {
                required,
                available: a.troops,
            });
        }
        Ok(required)
    }

    /// Execute one attack, mutating owner/troop state on both sides.
    ///
    /// The committed force is clamped up to the distance cost and must stay
    /// strictly below the attacker's garrison: an attack never empties the
    /// territory it came from. Both sides roll a multiplicative jitter on
    /// their power; the higher roll wins.
    pub fn execute_attack(
        &mut self,
        directory: &mut TerritoryDirectory,
        attacker: &TerritoryId,
        defender: &TerritoryId,
        requested_troops: u32,
        now_ms: u64,
    ) -> Result<AttackReport, AttackError> {
        let required = self.can_attack(directory, attacker, defender)?;

        let (attacker_owner, attacker_troops, attacker_name, from) = {
            let a = directory
                .get(attacker)
                .ok_or_else(|| AttackError::UnknownTerritory(attacker.clone()))?;
            (a.owner, a.troops, a.name.clone(), a.centroid)
        };
        let (defender_owner, defender_troops, defender_name, to) = {
            let d = directory
                .get(defender)
                .ok_or_else(|| AttackError::UnknownTerritory(defender.clone()))?;
            (d.owner, d.troops, d.name.clone(), d.centroid)
        };

        let committed = requested_troops.max(required);
        if committed >= attacker_troops {
            return Err(AttackError::InvalidTroopCount {
                committed,
                garrison: attacker_troops,
            });
        }

        let attack_power = committed as f64 * self.power_roll();
        let defense_power = defender_troops as f64 * self.power_roll();
        let victory = attack_power > defense_power;

        let mut report = AttackReport {
            attacker: attacker.clone(),
            defender: defender.clone(),
            attacker_name,
            defender_name,
            attacker_owner,
            defender_owner,
            troops_committed: committed,
            attack_power,
            defense_power,
            victory,
            attacker_losses: 0,
            defender_losses: 0,
        };

        if victory {
            // Survivors of the committed force garrison the captured
            // territory, never fewer than one.
            let survivors =
                (committed as f64 * (attack_power - defense_power) / attack_power).floor() as u32;
            if let Some(d) = directory.get_mut(defender) {
                d.set_owner(attacker_owner);
                d.troops = survivors.max(1);
            }
            if let Some(a) = directory.get_mut(attacker) {
                a.remove_troops(committed);
            }
            report.attacker_losses = committed - survivors;
            report.defender_losses = defender_troops;
        } else {
            let attacker_losses =
                (committed as f64 * self.config.repel_attacker_loss).ceil() as u32;
            let defender_losses =
                (defender_troops as f64 * self.config.repel_defender_loss).floor() as u32;
            if let Some(a) = directory.get_mut(attacker) {
                a.remove_troops(attacker_losses);
            }
            if let Some(d) = directory.get_mut(defender) {
                d.remove_troops(defender_losses);
            }
            report.attacker_losses = attacker_losses;
            report.defender_losses = defender_losses;
        }

        self.events.push(AttackEvent {
            from,
            to,
            started_at_ms: now_ms,
            duration_ms: self.config.attack_event_ms,
            victory,
        });
        log::debug!(
            "{} -> {}: committed {}, {} ({:.1} vs {:.1})",
            report.attacker,
            report.defender,
            committed,
            if victory { "captured" } else { "repelled" },
            attack_power,
            defense_power
        );
        self.reports.push(report.clone());
        Ok(report)
    }

    fn power_roll(&mut self) -> f64 {
        self.rng
            .gen_range(self.config.power_roll_min..self.config.power_roll_max)
    }

    /// Current visual events, pruning anything whose age reached its display
    /// duration. Repeated calls without time advancing are idempotent; once
    /// every event expires the list stays empty.
    pub fn active_attacks(&mut self, now_ms: u64) -> &[AttackEvent] {
        self.events
            .retain(|e| now_ms.saturating_sub(e.started_at_ms) < e.duration_ms);
        &self.events
    }

    /// Drain the reports accumulated since the last call. The controller
    /// turns these into game events once per tick, covering player and AI
    /// attacks alike.
    pub fn take_reports(&mut self) -> Vec<AttackReport> {
        std::mem::take(&mut self.reports)
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.reports.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GameBuilder;
    use proptest::prelude::*;

    /// Two adjacent squares 10 units apart plus one across the map.
    fn arena() -> (TerritoryDirectory, CombatResolver) {
        GameBuilder::new()
            .territory("atk", 0.0, 0.0, Owner::Player, 20)
            .territory("def", 10.0, 0.0, Owner::Neutral, 5)
            .territory("far", 350.0, 0.0, Owner::Ai, 8)
            .build_parts()
    }

    #[test]
    fn test_cost_minimum_at_zero_distance() {
        let (dir, resolver) = arena();
        // Same centroid -> distance 0 -> minimum cost.
        let cost = resolver
            .required_troops(&dir, &"atk".into(), &"atk".into())
            .unwrap();
        assert_eq!(cost, 1);
    }

    #[test]
    fn test_cost_maximum_beyond_map_span() {
        let (dir, resolver) = arena();
        let cost = resolver
            .required_troops(&dir, &"atk".into(), &"far".into())
            .unwrap();
        // 350 units away: ceil(1 + 350/360 * 9) = 10.
        assert_eq!(cost, 10);
    }

    #[test]
    fn test_can_attack_rejects_same_owner() {
        let (mut dir, resolver) = arena();
        dir.get_mut(&"def".into()).unwrap().set_owner(Owner::Player);
        assert_eq!(
            resolver.can_attack(&dir, &"atk".into(), &"def".into()),
            Err(AttackError::SameOwner)
        );
    }

    #[test]
    fn test_can_attack_rejects_unknown_territory() {
        let (dir, resolver) = arena();
        assert!(matches!(
            resolver.can_attack(&dir, &"nope".into(), &"def".into()),
            Err(AttackError::UnknownTerritory(_))
        ));
    }

    #[test]
    fn test_can_attack_requires_more_than_cost() {
        // Ten units of distance: ceil(1 + 10/360 * 9) = 2 troops required.
        let (mut dir, resolver) = arena();
        dir.get_mut(&"atk".into()).unwrap().troops = 2;
        assert_eq!(
            resolver.can_attack(&dir, &"atk".into(), &"def".into()),
            Err(AttackError::InsufficientTroops {
                required: 2,
                available: 2
            })
        );
        dir.get_mut(&"atk".into()).unwrap().troops = 3;
        assert_eq!(
            resolver.can_attack(&dir, &"atk".into(), &"def".into()),
            Ok(2)
        );
    }

    #[test]
    fn test_execute_rejects_full_garrison_commitment() {
        let (mut dir, mut resolver) = arena();
        let err = resolver
            .execute_attack(&mut dir, &"atk".into(), &"def".into(), 20, 0)
            .unwrap_err();
        assert_eq!(
            err,
            AttackError::InvalidTroopCount {
                committed: 20,
                garrison: 20
            }
        );
        // Rejections change nothing.
        assert_eq!(dir.get(&"atk".into()).unwrap().troops, 20);
        assert_eq!(dir.get(&"def".into()).unwrap().troops, 5);
    }

    #[test]
    fn test_guaranteed_capture_against_empty_garrison() {
        // Defense power is defender_troops * roll = 0, so any committed
        // force wins regardless of the RNG draw.
        let (mut dir, mut resolver) = arena();
        dir.get_mut(&"def".into()).unwrap().troops = 0;
        let report = resolver
            .execute_attack(&mut dir, &"atk".into(), &"def".into(), 15, 0)
            .unwrap();
        assert!(report.victory);
        assert_eq!(report.troops_committed, 15);
        let def = dir.get(&"def".into()).unwrap();
        assert_eq!(def.owner, Owner::Player);
        assert!(def.troops >= 1);
        assert!(def.troops <= 15);
        assert_eq!(dir.get(&"atk".into()).unwrap().troops, 5);
    }

    #[test]
    fn test_guaranteed_repulse_against_overwhelming_garrison() {
        // Max attack roll: 2 * 1.2 = 2.4; min defense roll: 100 * 0.8 = 80.
        let (mut dir, mut resolver) = arena();
        dir.get_mut(&"def".into()).unwrap().troops = 100;
        let report = resolver
            .execute_attack(&mut dir, &"atk".into(), &"def".into(), 2, 0)
            .unwrap();
        assert!(!report.victory);
        assert_eq!(report.attacker_losses, 2); // ceil(2 * 0.7)
        assert_eq!(report.defender_losses, 30); // floor(100 * 0.3)
        let def = dir.get(&"def".into()).unwrap();
        assert_eq!(def.owner, Owner::Neutral);
        assert_eq!(def.troops, 70);
        assert_eq!(dir.get(&"atk".into()).unwrap().troops, 18);
    }

    #[test]
    fn test_requested_troops_clamped_up_to_cost() {
        let (mut dir, mut resolver) = arena();
        dir.get_mut(&"atk".into()).unwrap().troops = 50;
        dir.get_mut(&"far".into()).unwrap().troops = 0;
        // Cost to "far" is 10; asking for 2 commits 10.
        let report = resolver
            .execute_attack(&mut dir, &"atk".into(), &"far".into(), 2, 0)
            .unwrap();
        assert_eq!(report.troops_committed, 10);
        assert_eq!(dir.get(&"atk".into()).unwrap().troops, 40);
    }

    #[test]
    fn test_attack_events_prune_by_age() {
        let (mut dir, mut resolver) = arena();
        dir.get_mut(&"def".into()).unwrap().troops = 0;
        resolver
            .execute_attack(&mut dir, &"atk".into(), &"def".into(), 15, 500)
            .unwrap();
        assert_eq!(resolver.active_attacks(500).len(), 1);
        assert_eq!(resolver.active_attacks(1_499).len(), 1);
        // Same instant again: idempotent.
        assert_eq!(resolver.active_attacks(1_499).len(), 1);
        assert_eq!(resolver.active_attacks(1_500).len(), 0);
        assert_eq!(resolver.active_attacks(1_500).len(), 0);
    }

    #[test]
    fn test_reports_drain_once() {
        let (mut dir, mut resolver) = arena();
        dir.get_mut(&"def".into()).unwrap().troops = 0;
        resolver
            .execute_attack(&mut dir, &"atk".into(), &"def".into(), 15, 0)
            .unwrap();
        assert_eq!(resolver.take_reports().len(), 1);
        assert!(resolver.take_reports().is_empty());
    }

    proptest! {
        /// Cost stays within [min, max] and never decreases with distance.
        #[test]
        fn prop_cost_bounded_and_monotone(d1 in 0.0..500.0f64, d2 in 0.0..500.0f64) {
            let (_, resolver) = arena();
            let origin = Point::new(0.0, 0.0);
            let near = Point::new(d1.min(d2), 0.0);
            let far = Point::new(d1.max(d2), 0.0);
            let near_cost = resolver.cost_between(&origin, &near);
            let far_cost = resolver.cost_between(&origin, &far);
            prop_assert!((1..=10).contains(&near_cost));
            prop_assert!((1..=10).contains(&far_cost));
            prop_assert!(near_cost <= far_cost);
        }

        /// Whatever the dice say, troops stay non-negative, the attacker
        /// never commits its whole garrison, and a rejection changes nothing.
        #[test]
        fn prop_attack_respects_garrison_invariants(
            attacker_troops in 0u32..60,
            defender_troops in 0u32..60,
            requested in 0u32..80,
            seed in 0u64..1_000,
        ) {
            let (mut dir, _) = arena();
            let mut resolver = CombatResolver::new(GameConfig::default(), seed);
            dir.get_mut(&"atk".into()).unwrap().troops = attacker_troops;
            dir.get_mut(&"def".into()).unwrap().troops = defender_troops;

            let result =
                resolver.execute_attack(&mut dir, &"atk".into(), &"def".into(), requested, 0);

            let atk = dir.get(&"atk".into()).unwrap();
            let def = dir.get(&"def".into()).unwrap();
            match result {
                Ok(report) => {
                    prop_assert!(report.troops_committed < attacker_troops);
                    prop_assert!(report.troops_committed >= 1);
                    prop_assert!(atk.troops < attacker_troops);
                    if report.victory {
                        prop_assert_eq!(def.owner, Owner::Player);
                        prop_assert!(def.troops >= 1);
                    } else {
                        prop_assert_eq!(def.owner, Owner::Neutral);
                    }
                }
                Err(_) => {
                    prop_assert_eq!(atk.troops, attacker_troops);
                    prop_assert_eq!(def.troops, defender_troops);
                    prop_assert_eq!(def.owner, Owner::Neutral);
                }
            }
        }
    }
}
