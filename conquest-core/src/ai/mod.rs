//! AI opponents.
//!
//! Each agent runs the same greedy doctrine: push out of the strongest
//! border territory toward the weakest reachable target, preferring the
//! player's holdings over neutral land most of the time. Agents act on a
//! fixed wall-clock cadence divided by the game speed, so speeding the game
//! up makes them act proportionally more often.
//!
//! Agents must be deterministic given the same seed; every agent owns its
//! own seeded RNG and the coordinator derives those seeds from one master
//! seed.

use crate::combat::CombatResolver;
use crate::config::GameConfig;
use crate::directory::TerritoryDirectory;
use crate::territory::{Owner, Territory, TerritoryId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One autonomous competitor.
pub struct AiAgent {
    id: String,
    last_action_ms: u64,
    interval_ms: u64,
    /// Where this agent entered the map. Informational only; the agent
    /// fights for the collective AI side, not for this one territory.
    starting_territory: Option<TerritoryId>,
    rng: StdRng,
}

impl AiAgent {
    pub fn new(id: impl Into<String>, interval_ms: u64, seed: u64) -> Self {
        Self {
            id: id.into(),
            last_action_ms: 0,
            interval_ms,
            starting_territory: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn starting_territory(&self) -> Option<&TerritoryId> {
        self.starting_territory.as_ref()
    }

    /// Claim a random neutral territory as this agent's foothold. No-op on a
    /// map with no neutral land left.
    pub fn claim_start(&mut self, directory: &mut TerritoryDirectory, troops: u32) {
        let neutrals: Vec<TerritoryId> = directory
            .by_owner(Owner::Neutral)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        if neutrals.is_empty() {
            log::warn!("{}: no neutral territory left to claim", self.id);
            return;
        }
        let pick = neutrals[self.rng.gen_range(0..neutrals.len())].clone();
        if let Some(t) = directory.get_mut(&pick) {
            t.set_owner(Owner::Ai);
            t.troops = troops;
        }
        log::info!("{} starts at {}", self.id, pick);
        self.starting_territory = Some(pick);
    }

    /// Act if the (speed-scaled) action interval has elapsed.
    pub fn update(
        &mut self,
        directory: &mut TerritoryDirectory,
        resolver: &mut CombatResolver,
        config: &GameConfig,
        now_ms: u64,
        speed: f64,
    ) {
        let adjusted_interval = self.interval_ms as f64 / speed;
        if (now_ms.saturating_sub(self.last_action_ms) as f64) < adjusted_interval {
            return;
        }
        self.last_action_ms = now_ms;
        self.act(directory, resolver, config, now_ms);
    }

    /// One decision pass. Every early-out here is a legitimate no-op, not an
    /// error: an agent with no holdings is defeated but stays in the roster.
    fn act(
        &mut self,
        directory: &mut TerritoryDirectory,
        resolver: &mut CombatResolver,
        config: &GameConfig,
        now_ms: u64,
    ) {
        let owned = directory.by_owner(Owner::Ai);
        if owned.is_empty() {
            return;
        }

        // Border territories: owned, with at least one neighbor that isn't.
        let border: Vec<&Territory> = owned
            .iter()
            .copied()
            .filter(|t| {
                t.neighbors
                    .iter()
                    .any(|id| matches!(directory.get(id), Some(n) if n.owner != Owner::Ai))
            })
            .collect();
        if border.is_empty() {
            return;
        }

        // Push from the strongest border garrison (first wins ties).
        let attack_from = border
            .iter()
            .copied()
            .fold(None::<&Territory>, |best, t| match best {
                Some(b) if t.troops <= b.troops => Some(b),
                _ => Some(t),
            })
            .map(|t| (t.id.clone(), t.troops, t.neighbors.clone()));
        let Some((from_id, from_troops, neighbors)) = attack_from else {
            return;
        };
        if from_troops <= config.ai_reserve_floor {
            return;
        }

        let candidates: Vec<&Territory> = neighbors
            .iter()
            .filter_map(|id| directory.get(id))
            .filter(|t| t.owner != Owner::Ai)
            .collect();
        if candidates.is_empty() {
            return;
        }

        let player_targets: Vec<&Territory> = candidates
            .iter()
            .copied()
            .filter(|t| t.owner == Owner::Player)
            .collect();
        let neutral_targets: Vec<&Territory> = candidates
            .iter()
            .copied()
            .filter(|t| t.owner == Owner::Neutral)
            .collect();

        let target = if !player_targets.is_empty() && self.rng.gen_bool(config.ai_player_bias) {
            weakest(&player_targets)
        } else if !neutral_targets.is_empty() {
            weakest(&neutral_targets)
        } else {
            weakest(&candidates)
        };
        let Some(target_id) = target.map(|t| t.id.clone()) else {
            return;
        };

        let committed = (from_troops as f64 * config.ai_commit_ratio).floor() as u32;
        if committed == 0 {
            return;
        }

        if let Err(e) = resolver.execute_attack(directory, &from_id, &target_id, committed, now_ms)
        {
            log::debug!("{}: attack {} -> {} rejected: {}", self.id, from_id, target_id, e);
        }
    }
}

/// Lowest garrison wins; first wins ties.
fn weakest<'a>(targets: &[&'a Territory]) -> Option<&'a Territory> {
    targets.iter().copied().fold(None, |best, t| match best {
        Some(b) if t.troops >= b.troops => Some(b),
        _ => Some(t),
    })
}

/// Owns the AI roster and ticks it uniformly.
pub struct AiCoordinator {
    agents: Vec<AiAgent>,
    config: GameConfig,
}

impl AiCoordinator {
    pub fn new(config: GameConfig, master_seed: u64) -> Self {
        let agents = (0..config.ai_count)
            .map(|i| {
                let seed = master_seed.wrapping_add(0x9E37_79B9_7F4A_7C15u64.wrapping_mul(i as u64 + 1));
                AiAgent::new(format!("ai_{i}"), config.ai_interval_ms, seed)
            })
            .collect();
        Self { agents, config }
    }

    /// Give every agent a random neutral foothold with a fixed garrison.
    /// `now_ms` starts each agent's action cadence: the first move comes one
    /// full interval after spawn.
    pub fn initialize(&mut self, directory: &mut TerritoryDirectory, now_ms: u64) {
        let troops = self.config.ai_starting_troops;
        for agent in &mut self.agents {
            agent.last_action_ms = now_ms;
            agent.claim_start(directory, troops);
        }
    }

    pub fn update(
        &mut self,
        directory: &mut TerritoryDirectory,
        resolver: &mut CombatResolver,
        now_ms: u64,
        speed: f64,
    ) {
        for agent in &mut self.agents {
            agent.update(directory, resolver, &self.config, now_ms, speed);
        }
    }

    /// True once the AI side holds nothing.
    pub fn is_defeated(&self, directory: &TerritoryDirectory) -> bool {
        directory.count_owned(Owner::Ai) == 0
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn agents(&self) -> &[AiAgent] {
        &self.agents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GameBuilder;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn test_coordinator_claims_starts() {
        let (mut dir, _) = GameBuilder::new()
            .territory("a", 0.0, 0.0, Owner::Neutral, 8)
            .territory("b", 100.0, 0.0, Owner::Neutral, 8)
            .territory("c", 200.0, 0.0, Owner::Neutral, 8)
            .territory("d", 300.0, 0.0, Owner::Neutral, 8)
            .build_parts();
        let mut coordinator = AiCoordinator::new(config(), 99);
        coordinator.initialize(&mut dir, 0);
        assert_eq!(dir.count_owned(Owner::Ai), 3);
        for t in dir.by_owner(Owner::Ai) {
            assert_eq!(t.troops, 15);
        }
        assert!(!coordinator.is_defeated(&dir));
    }

    #[test]
    fn test_start_claims_stop_when_no_neutrals_remain() {
        let (mut dir, _) = GameBuilder::new()
            .territory("a", 0.0, 0.0, Owner::Player, 8)
            .territory("b", 100.0, 0.0, Owner::Neutral, 8)
            .build_parts();
        let mut coordinator = AiCoordinator::new(config(), 99);
        coordinator.initialize(&mut dir, 0);
        // Three agents, one neutral territory: only one claim lands.
        assert_eq!(dir.count_owned(Owner::Ai), 1);
        assert_eq!(dir.count_owned(Owner::Player), 1);
    }

    #[test]
    fn test_agent_waits_for_its_interval() {
        let (mut dir, mut resolver) = GameBuilder::new()
            .territory("home", 0.0, 0.0, Owner::Ai, 10)
            .territory("prey", 10.0, 0.0, Owner::Neutral, 0)
            .build_parts();
        let mut agent = AiAgent::new("ai_0", 3_000, 7);
        // Too early: nothing happens.
        agent.update(&mut dir, &mut resolver, &config(), 1_000, 1.0);
        assert_eq!(dir.get(&"prey".into()).unwrap().owner, Owner::Neutral);
        // Interval elapsed: the 0-troop neighbor is taken (defense power is
        // zero, so the outcome doesn't depend on the dice).
        agent.update(&mut dir, &mut resolver, &config(), 3_000, 1.0);
        assert_eq!(dir.get(&"prey".into()).unwrap().owner, Owner::Ai);
    }

    #[test]
    fn test_speed_shortens_the_interval() {
        let (mut dir, mut resolver) = GameBuilder::new()
            .territory("home", 0.0, 0.0, Owner::Ai, 10)
            .territory("prey", 10.0, 0.0, Owner::Neutral, 0)
            .build_parts();
        let mut agent = AiAgent::new("ai_0", 3_000, 7);
        // At 4x speed the 3000ms cadence becomes 750ms.
        agent.update(&mut dir, &mut resolver, &config(), 750, 4.0);
        assert_eq!(dir.get(&"prey".into()).unwrap().owner, Owner::Ai);
    }

    #[test]
    fn test_agent_respects_reserve_floor() {
        let (mut dir, mut resolver) = GameBuilder::new()
            .territory("home", 0.0, 0.0, Owner::Ai, 3)
            .territory("prey", 10.0, 0.0, Owner::Neutral, 0)
            .build_parts();
        let mut agent = AiAgent::new("ai_0", 3_000, 7);
        agent.update(&mut dir, &mut resolver, &config(), 3_000, 1.0);
        assert_eq!(dir.get(&"prey".into()).unwrap().owner, Owner::Neutral);
        assert_eq!(dir.get(&"home".into()).unwrap().troops, 3);
    }

    #[test]
    fn test_agent_with_no_holdings_is_a_noop() {
        let (mut dir, mut resolver) = GameBuilder::new()
            .territory("a", 0.0, 0.0, Owner::Player, 10)
            .territory("b", 10.0, 0.0, Owner::Neutral, 5)
            .build_parts();
        let checksum = dir.checksum();
        let mut agent = AiAgent::new("ai_0", 3_000, 7);
        agent.update(&mut dir, &mut resolver, &config(), 10_000, 1.0);
        assert_eq!(dir.checksum(), checksum);
    }

    #[test]
    fn test_landlocked_agent_holds_position() {
        // AI surrounded only by its own land: no border, no move.
        let (mut dir, mut resolver) = GameBuilder::new()
            .territory("core", 0.0, 0.0, Owner::Ai, 30)
            .territory("ring", 10.0, 0.0, Owner::Ai, 5)
            .build_parts();
        let checksum = dir.checksum();
        let mut agent = AiAgent::new("ai_0", 3_000, 7);
        agent.update(&mut dir, &mut resolver, &config(), 10_000, 1.0);
        assert_eq!(dir.checksum(), checksum);
    }

    #[test]
    fn test_attacks_from_strongest_border_territory() {
        // Two AI territories border neutral land; the stronger one leads.
        let (mut dir, mut resolver) = GameBuilder::new()
            .territory("weakfort", 0.0, 0.0, Owner::Ai, 6)
            .territory("stronghold", 0.0, 10.0, Owner::Ai, 40)
            .territory("prey", 10.0, 10.0, Owner::Neutral, 0)
            .territory("other", 10.0, 0.0, Owner::Neutral, 0)
            .build_parts();
        let mut agent = AiAgent::new("ai_0", 3_000, 7);
        agent.update(&mut dir, &mut resolver, &config(), 3_000, 1.0);
        // Commit is floor(40 * 0.7) = 28 out of the stronghold.
        assert_eq!(dir.get(&"stronghold".into()).unwrap().troops, 12);
        assert_eq!(dir.get(&"weakfort".into()).unwrap().troops, 6);
    }

    #[test]
    fn test_prefers_weakest_neutral_when_no_player_in_reach() {
        let (mut dir, mut resolver) = GameBuilder::new()
            .territory("home", 0.0, 0.0, Owner::Ai, 20)
            .territory("tough", 10.0, 0.0, Owner::Neutral, 200)
            .territory("soft", 0.0, 10.0, Owner::Neutral, 0)
            .build_parts();
        let mut agent = AiAgent::new("ai_0", 3_000, 7);
        agent.update(&mut dir, &mut resolver, &config(), 3_000, 1.0);
        assert_eq!(dir.get(&"soft".into()).unwrap().owner, Owner::Ai);
        assert_eq!(dir.get(&"tough".into()).unwrap().owner, Owner::Neutral);
    }
}
