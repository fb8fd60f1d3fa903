//! Test support: hand-built worlds with chosen owners, garrisons and
//! centroid spacing.
//!
//! Territories are 4×4 squares centered where the test puts them, so
//! adjacency falls out of the configured centroid threshold (default 15.0:
//! squares 10 apart are neighbors, 100 apart are not) and pointer tests can
//! click the centroid.

use crate::combat::CombatResolver;
use crate::config::GameConfig;
use crate::controller::GameController;
use crate::directory::TerritoryDirectory;
use crate::geometry::{Geometry, Point};
use crate::territory::{MapRecord, Owner};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A 4×4 square territory centered on (cx, cy).
pub fn square_record(id: &str, cx: f64, cy: f64) -> MapRecord {
    let half = 2.0;
    MapRecord {
        id: id.to_string(),
        name: format!("Land of {id}"),
        geometry: Geometry::Polygon(vec![vec![
            Point::new(cx - half, cy - half),
            Point::new(cx + half, cy - half),
            Point::new(cx + half, cy + half),
            Point::new(cx - half, cy + half),
        ]]),
    }
}

struct TerritoryPlan {
    id: String,
    cx: f64,
    cy: f64,
    owner: Owner,
    troops: u32,
}

pub struct GameBuilder {
    config: GameConfig,
    seed: u64,
    plans: Vec<TerritoryPlan>,
}

impl GameBuilder {
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            seed: 1234,
            plans: Vec::new(),
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Adjust the configuration in place.
    pub fn config(mut self, adjust: impl FnOnce(&mut GameConfig)) -> Self {
        adjust(&mut self.config);
        self
    }

    pub fn territory(mut self, id: &str, cx: f64, cy: f64, owner: Owner, troops: u32) -> Self {
        self.plans.push(TerritoryPlan {
            id: id.to_string(),
            cx,
            cy,
            owner,
            troops,
        });
        self
    }

    fn records(&self) -> Vec<MapRecord> {
        self.plans
            .iter()
            .map(|s| square_record(&s.id, s.cx, s.cy))
            .collect()
    }

    /// Directory plus resolver, owners and garrisons exactly as specified.
    pub fn build_parts(self) -> (TerritoryDirectory, CombatResolver) {
        let mut directory = TerritoryDirectory::new();
        let mut rng = StdRng::seed_from_u64(self.seed);
        directory
            .load(
                &self.records(),
                self.config.initial_troops_min,
                self.config.initial_troops_max,
                &mut rng,
            )
            .expect("builder map is well-formed");
        directory.build_adjacency(self.config.neighbor_distance);
        for plan in &self.plans {
            if let Some(t) = directory.get_mut(&plan.id.as_str().into()) {
                t.set_owner(plan.owner);
                t.troops = plan.troops;
            }
        }
        let resolver = CombatResolver::new(self.config.clone(), self.seed.wrapping_add(1));
        (directory, resolver)
    }

    /// A full controller, map ingested (so it sits in SELECTION), with the
    /// specified owners and garrisons applied on top of the load.
    pub fn build_controller(self) -> GameController {
        let mut game = GameController::new(self.config.clone(), self.seed);
        game.ingest_map(self.records())
            .expect("builder map is well-formed");
        for plan in &self.plans {
            if let Some(t) = game.directory_mut().get_mut(&plan.id.as_str().into()) {
                t.set_owner(plan.owner);
                t.troops = plan.troops;
            }
        }
        game
    }
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_applies_plans() {
        let (dir, _) = GameBuilder::new()
            .territory("a", 0.0, 0.0, Owner::Player, 42)
            .territory("b", 10.0, 0.0, Owner::Neutral, 0)
            .build_parts();
        let a = dir.get(&"a".into()).unwrap();
        assert_eq!(a.owner, Owner::Player);
        assert_eq!(a.troops, 42);
        assert!(a.is_neighbor(&"b".into()));
    }
}
