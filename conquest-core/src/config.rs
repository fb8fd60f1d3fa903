use serde::{Deserialize, Serialize};

/// Gameplay configuration.
///
/// Externalized constants that can be adjusted without recompiling. The
/// defaults reproduce the classic balance; tests override individual fields
/// through [`crate::testing::GameBuilder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Centroid distance (world units) under which two territories are
    /// linked as neighbors. This deliberately approximates shared borders:
    /// very large territories with distant centroids are never linked even
    /// when their outlines touch.
    pub neighbor_distance: f64,

    /// Initial troop roll for freshly loaded territories: `[min, max)`.
    pub initial_troops_min: u32,
    pub initial_troops_max: u32,

    /// Attack cost interpolation: neighbors cost `min_attack_cost`, the far
    /// side of the map costs `max_attack_cost`.
    pub min_attack_cost: u32,
    pub max_attack_cost: u32,
    /// Normalizing distance for the cost curve (a full longitude span).
    pub max_map_distance: f64,

    /// Multiplicative jitter applied to both sides' combat power.
    pub power_roll_min: f64,
    pub power_roll_max: f64,

    /// Losses when the defense holds, as fractions of the committed force
    /// and the defending garrison.
    pub repel_attacker_loss: f64,
    pub repel_defender_loss: f64,

    /// How long a resolved attack stays visible, in milliseconds.
    pub attack_event_ms: u64,

    /// Troop production cadence and formula: every territory of a side gains
    /// `production_base + floor(owned_count * production_bonus)` per tick.
    pub production_interval_ms: u64,
    pub production_base: u32,
    pub production_bonus: f64,

    /// Time the player has to pick a starting territory before one is picked
    /// for them.
    pub selection_timeout_ms: u64,
    /// Garrison granted to the player's chosen starting territory.
    pub starting_troops: u32,

    /// Opponent roster and pacing.
    pub ai_count: usize,
    pub ai_interval_ms: u64,
    pub ai_starting_troops: u32,
    /// An AI never attacks out of a territory holding this few troops.
    pub ai_reserve_floor: u32,
    /// Fraction of the garrison an AI commits to an attack.
    pub ai_commit_ratio: f64,
    /// Probability that an AI prefers a player-owned target over a neutral
    /// one when both are in reach. Balance tuning, not correctness.
    pub ai_player_bias: f64,

    /// Fraction of the garrison the player commits to an attack.
    pub player_commit_ratio: f64,

    /// Time-multiplier bounds; adjustments double or halve within these.
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            neighbor_distance: 15.0,
            initial_troops_min: 5,
            initial_troops_max: 15,
            min_attack_cost: 1,
            max_attack_cost: 10,
            max_map_distance: 360.0,
            power_roll_min: 0.8,
            power_roll_max: 1.2,
            repel_attacker_loss: 0.7,
            repel_defender_loss: 0.3,
            attack_event_ms: 1_000,
            production_interval_ms: 5_000,
            production_base: 2,
            production_bonus: 0.5,
            selection_timeout_ms: 15_000,
            starting_troops: 20,
            ai_count: 3,
            ai_interval_ms: 3_000,
            ai_starting_troops: 15,
            ai_reserve_floor: 3,
            ai_commit_ratio: 0.7,
            ai_player_bias: 0.7,
            player_commit_ratio: 0.75,
            min_speed: 0.25,
            max_speed: 8.0,
        }
    }
}
