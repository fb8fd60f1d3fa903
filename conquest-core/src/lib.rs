//! # Conquest Core
//!
//! Real-time territory-conquest simulation: a map of territories owned by
//! the player, a collective AI opposition or nobody, contested through troop
//! production and probabilistic combat.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │ Pointer port │────▶│                │────▶│ TerritoryDirectory│
//! │ + Commands   │     │ GameController │     │ (spatial queries) │
//! └──────────────┘     │  tick(delta)   │     └──────────────────┘
//!                      │                │────▶ CombatResolver
//! ┌──────────────┐     │                │────▶ AiCoordinator
//! │ Driver loop  │────▶│                │────▶ PhaseMachine
//! └──────────────┘     └───────┬────────┘
//!                              │ snapshot per frame
//!                      ┌───────▼────────┐
//!                      │   Observers    │ (renderer, event log)
//!                      └────────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`GameController`] | Owns the whole session; `tick(delta)` + input ports |
//! | [`TerritoryDirectory`] | Territory collection, adjacency, point location |
//! | [`CombatResolver`] | Validates and resolves attacks |
//! | [`AiCoordinator`] | Ticks the AI roster |
//! | [`GamePhase`] | MENU → SELECTION → GAMEPLAY → VICTORY/DEFEAT |
//! | [`Snapshot`] | Immutable per-tick view for observers |
//!
//! The core is driver-agnostic: an external loop calls `tick` with frame
//! deltas and forwards world-coordinate pointer events through the
//! [`PointerInput`] port. Nothing in here blocks, spawns threads or touches
//! a real clock.

pub mod ai;
pub mod combat;
pub mod config;
pub mod controller;
pub mod directory;
pub mod geometry;
pub mod input;
pub mod observer;
pub mod phase;
pub mod snapshot;
pub mod systems;
pub mod territory;
pub mod testing;

pub use ai::{AiAgent, AiCoordinator};
pub use combat::{AttackError, AttackEvent, AttackReport, CombatResolver};
pub use config::GameConfig;
pub use controller::{CommandError, GameController};
pub use directory::{LoadError, TerritoryDirectory};
pub use geometry::{Bounds, Geometry, Point, Ring};
pub use input::{Command, PointerInput};
pub use observer::{
    EventLogObserver, GameEvent, GameObserver, ObserverConfig, ObserverError, ObserverRegistry,
    Snapshot,
};
pub use phase::{GamePhase, PhaseError, PhaseMachine};
pub use snapshot::{RenderState, TerritoryView};
pub use systems::{evaluate_outcome, run_production_tick, ProductionGrant};
pub use territory::{MapRecord, Owner, Territory, TerritoryId};
