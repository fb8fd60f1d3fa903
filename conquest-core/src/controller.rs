//! The top-level game controller.
//!
//! Owns one territory directory, one combat resolver, one AI coordinator,
//! one phase machine and the session clock. An external driver loop calls
//! [`GameController::tick`] with frame deltas and reads
//! [`GameController::snapshot`] afterwards; player input arrives through the
//! [`PointerInput`] port and the [`Command`] surface.
//!
//! Everything runs on the single tick — no locks, no timers to cancel. All
//! schedules are compared against the controller's monotonic clock: the
//! production window scales its elapsed time by the speed multiplier, AI
//! cadences divide by it, and the selection countdown and attack-event ages
//! run unscaled. Pause gates the gameplay update branch; the clock itself
//! keeps advancing.

use crate::ai::AiCoordinator;
use crate::combat::{AttackError, AttackReport, CombatResolver};
use crate::config::GameConfig;
use crate::directory::{LoadError, TerritoryDirectory};
use crate::input::{Command, PointerInput};
use crate::observer::{GameEvent, Snapshot};
use crate::phase::{GamePhase, PhaseMachine};
use crate::snapshot::{RenderState, TerritoryView};
use crate::systems::{evaluate_outcome, run_production_tick};
use crate::territory::{MapRecord, Owner, TerritoryId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("command not available in phase {phase:?}")]
    WrongPhase { phase: GamePhase },
    #[error("territory {0} does not exist")]
    UnknownTerritory(TerritoryId),
    #[error("territory {0} is not neutral")]
    NotNeutral(TerritoryId),
    #[error("territory {0} is not player-owned")]
    NotOwned(TerritoryId),
    #[error("garrison too small to attack from")]
    GarrisonTooSmall,
    #[error(transparent)]
    Attack(#[from] AttackError),
}

pub struct GameController {
    config: GameConfig,
    seed: u64,
    rng: StdRng,

    phase: PhaseMachine,
    directory: TerritoryDirectory,
    resolver: CombatResolver,
    /// Spawned on entering GAMEPLAY, torn down by restart.
    coordinator: Option<AiCoordinator>,
    /// Retained so a restart can rebuild the whole core from scratch.
    records: Vec<MapRecord>,

    // Monotonic session clock, advanced once per tick by the raw delta.
    now_ms: u64,
    ticks: u64,
    last_production_ms: u64,
    selection_started_ms: Option<u64>,

    paused: bool,
    speed: f64,

    selected: Option<TerritoryId>,
    hovered: Option<TerritoryId>,
    drag_source: Option<TerritoryId>,
    drag_target: Option<TerritoryId>,

    /// Game events accumulated since the last snapshot.
    events: Vec<GameEvent>,
}

impl GameController {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let resolver = CombatResolver::new(config.clone(), rng.gen());
        Self {
            config,
            seed,
            rng,
            phase: PhaseMachine::new(),
            directory: TerritoryDirectory::new(),
            resolver,
            coordinator: None,
            records: Vec::new(),
            now_ms: 0,
            ticks: 0,
            last_production_ms: 0,
            selection_started_ms: None,
            paused: false,
            speed: 1.0,
            selected: None,
            hovered: None,
            drag_source: None,
            drag_target: None,
            events: Vec::new(),
        }
    }

    /// Feed the parsed map in. MENU → SELECTION on success; on failure the
    /// controller stays in MENU and the caller owns any fallback policy.
    pub fn ingest_map(&mut self, records: Vec<MapRecord>) -> Result<(), LoadError> {
        let mut directory = TerritoryDirectory::new();
        directory.load(
            &records,
            self.config.initial_troops_min,
            self.config.initial_troops_max,
            &mut self.rng,
        )?;
        directory.build_adjacency(self.config.neighbor_distance);
        self.directory = directory;
        self.records = records;
        self.selection_started_ms = Some(self.now_ms);
        self.set_phase(GamePhase::Selection);
        Ok(())
    }

    /// Tear the session down and rebuild it from the retained map records.
    /// The clock keeps running; everything else starts over.
    pub fn restart(&mut self) {
        log::info!("restarting session");
        self.phase = PhaseMachine::new();
        self.directory = TerritoryDirectory::new();
        self.resolver = CombatResolver::new(self.config.clone(), self.rng.gen());
        self.coordinator = None;
        self.last_production_ms = self.now_ms;
        self.selection_started_ms = None;
        self.paused = false;
        self.speed = 1.0;
        self.selected = None;
        self.hovered = None;
        self.drag_source = None;
        self.drag_target = None;
        self.events.clear();
        if !self.records.is_empty() {
            let records = std::mem::take(&mut self.records);
            if let Err(e) = self.ingest_map(records) {
                log::error!("restart failed to reload map: {e}");
            }
        }
    }

    /// Advance the session by one frame delta.
    pub fn tick(&mut self, delta: Duration) {
        self.now_ms += delta.as_millis() as u64;
        self.ticks += 1;

        match self.phase.current() {
            GamePhase::Selection => {
                if let Some(started) = self.selection_started_ms {
                    if self.now_ms.saturating_sub(started) > self.config.selection_timeout_ms {
                        self.auto_select_start();
                    }
                }
            }
            GamePhase::Gameplay if !self.paused => {
                self.update_production();
                if let Some(coordinator) = self.coordinator.as_mut() {
                    coordinator.update(
                        &mut self.directory,
                        &mut self.resolver,
                        self.now_ms,
                        self.speed,
                    );
                }
                self.drain_combat_reports();
                if let Some(outcome) = evaluate_outcome(&self.directory) {
                    self.set_phase(outcome);
                    self.events.push(GameEvent::GameOver {
                        at_ms: self.now_ms,
                        outcome,
                    });
                }
            }
            _ => {}
        }
    }

    fn update_production(&mut self) {
        let elapsed =
            self.now_ms.saturating_sub(self.last_production_ms) as f64 * self.speed;
        if elapsed >= self.config.production_interval_ms as f64 {
            self.last_production_ms = self.now_ms;
            let grant = run_production_tick(
                &mut self.directory,
                self.config.production_base,
                self.config.production_bonus,
            );
            self.events.push(GameEvent::ProductionGranted {
                at_ms: self.now_ms,
                player_territories: grant.player_territories,
                player_per_territory: grant.player_per_territory,
                ai_territories: grant.ai_territories,
                ai_per_territory: grant.ai_per_territory,
            });
        }
    }

    fn drain_combat_reports(&mut self) {
        let at_ms = self.now_ms;
        for report in self.resolver.take_reports() {
            if report.victory {
                let survivors = report
                    .troops_committed
                    .saturating_sub(report.attacker_losses)
                    .max(1);
                self.events.push(GameEvent::TerritoryCaptured {
                    at_ms,
                    territory: report.defender,
                    attacker: report.attacker,
                    from: report.defender_owner,
                    to: report.attacker_owner,
                    survivors,
                });
            } else {
                self.events.push(GameEvent::AttackRepelled {
                    at_ms,
                    attacker: report.attacker,
                    defender: report.defender,
                    attacker_losses: report.attacker_losses,
                    defender_losses: report.defender_losses,
                });
            }
        }
    }

    fn auto_select_start(&mut self) {
        let neutrals: Vec<TerritoryId> = self
            .directory
            .by_owner(Owner::Neutral)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        if neutrals.is_empty() {
            return;
        }
        let pick = neutrals[self.rng.gen_range(0..neutrals.len())].clone();
        log::info!("selection timed out, auto-claiming {pick}");
        if let Err(e) = self.claim_start(&pick, true) {
            log::warn!("auto-select failed: {e}");
        }
    }

    /// Fix the player's starting territory, spawn the opposition and enter
    /// GAMEPLAY.
    fn claim_start(&mut self, id: &TerritoryId, auto: bool) -> Result<(), CommandError> {
        let territory = self
            .directory
            .get(id)
            .ok_or_else(|| CommandError::UnknownTerritory(id.clone()))?;
        if territory.owner != Owner::Neutral {
            return Err(CommandError::NotNeutral(id.clone()));
        }
        if let Some(t) = self.directory.get_mut(id) {
            t.set_owner(Owner::Player);
            t.troops = self.config.starting_troops;
        }

        let mut coordinator = AiCoordinator::new(self.config.clone(), self.rng.gen());
        coordinator.initialize(&mut self.directory, self.now_ms);
        self.coordinator = Some(coordinator);

        self.last_production_ms = self.now_ms;
        self.selection_started_ms = None;
        self.events.push(GameEvent::StartSelected {
            at_ms: self.now_ms,
            territory: id.clone(),
            auto,
        });
        self.set_phase(GamePhase::Gameplay);
        Ok(())
    }

    /// Attack out of a player-owned territory, committing the configured
    /// fraction of its garrison. Success clears the selection.
    fn attack_territory(
        &mut self,
        source: &TerritoryId,
        target: &TerritoryId,
    ) -> Result<AttackReport, CommandError> {
        let attacker = self
            .directory
            .get(source)
            .ok_or_else(|| CommandError::UnknownTerritory(source.clone()))?;
        if attacker.owner != Owner::Player {
            return Err(CommandError::NotOwned(source.clone()));
        }
        if attacker.troops <= 1 {
            return Err(CommandError::GarrisonTooSmall);
        }
        let committed = (attacker.troops as f64 * self.config.player_commit_ratio).floor() as u32;
        if committed < 1 {
            return Err(CommandError::GarrisonTooSmall);
        }
        let report = self.resolver.execute_attack(
            &mut self.directory,
            source,
            target,
            committed,
            self.now_ms,
        )?;
        self.selected = None;
        Ok(report)
    }

    /// Run one command from the UI surface.
    pub fn execute(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Restart => {
                self.restart();
                Ok(())
            }
            Command::Pause => {
                self.paused = true;
                Ok(())
            }
            Command::Resume => {
                self.paused = false;
                Ok(())
            }
            Command::SetSpeed { speed } => {
                self.speed = speed.clamp(self.config.min_speed, self.config.max_speed);
                Ok(())
            }
            Command::SpeedUp => {
                self.speed = (self.speed * 2.0).min(self.config.max_speed);
                Ok(())
            }
            Command::SlowDown => {
                self.speed = (self.speed / 2.0).max(self.config.min_speed);
                Ok(())
            }
            Command::ResetSpeed => {
                self.speed = 1.0;
                Ok(())
            }
            Command::SelectTerritory { territory } => match self.phase.current() {
                GamePhase::Selection => self.claim_start(&territory, false),
                GamePhase::Gameplay => {
                    let t = self
                        .directory
                        .get(&territory)
                        .ok_or_else(|| CommandError::UnknownTerritory(territory.clone()))?;
                    if t.owner != Owner::Player {
                        return Err(CommandError::NotOwned(territory));
                    }
                    self.selected = Some(territory);
                    Ok(())
                }
                phase => Err(CommandError::WrongPhase { phase }),
            },
            Command::Attack { source, target } => {
                if self.phase.current() != GamePhase::Gameplay {
                    return Err(CommandError::WrongPhase {
                        phase: self.phase.current(),
                    });
                }
                self.attack_territory(&source, &target).map(|_| ())
            }
        }
    }

    fn set_phase(&mut self, next: GamePhase) {
        match self.phase.transition(next) {
            Ok(old) => self.events.push(GameEvent::PhaseChanged {
                at_ms: self.now_ms,
                from: old,
                to: next,
            }),
            Err(e) => log::warn!("{e}"),
        }
    }

    /// Build the per-frame render snapshot and drain pending events into it.
    pub fn snapshot(&mut self) -> Snapshot {
        let state = self.render_state();
        Snapshot::new(
            state,
            self.ticks,
            self.directory.checksum(),
            std::mem::take(&mut self.events),
        )
    }

    fn render_state(&mut self) -> RenderState {
        let territories: Vec<TerritoryView> = self.directory.all().map(TerritoryView::from).collect();
        let production_countdown_s = if self.phase.current() == GamePhase::Gameplay {
            let elapsed =
                self.now_ms.saturating_sub(self.last_production_ms) as f64 * self.speed;
            let remaining = (self.config.production_interval_ms as f64 - elapsed).max(0.0);
            (remaining / 1_000.0).ceil() as u32
        } else {
            (self.config.production_interval_ms / 1_000) as u32
        };
        let selection_remaining_ms = match (self.phase.current(), self.selection_started_ms) {
            (GamePhase::Selection, Some(started)) => self
                .config
                .selection_timeout_ms
                .saturating_sub(self.now_ms.saturating_sub(started)),
            _ => 0,
        };
        RenderState {
            phase: self.phase.current(),
            player_territories: self.directory.count_owned(Owner::Player),
            ai_territories: self.directory.count_owned(Owner::Ai),
            neutral_territories: self.directory.count_owned(Owner::Neutral),
            territories,
            selected: self.selected.clone(),
            hovered: self.hovered.clone(),
            drag_source: self.drag_source.clone(),
            drag_target: self.drag_target.clone(),
            attacks: self.resolver.active_attacks(self.now_ms).to_vec(),
            production_countdown_s,
            selection_remaining_ms,
            paused: self.paused,
            speed: self.speed,
        }
    }

    // Accessors for drivers and tests.

    pub fn phase(&self) -> GamePhase {
        self.phase.current()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn directory(&self) -> &TerritoryDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut TerritoryDirectory {
        &mut self.directory
    }

    pub fn coordinator(&self) -> Option<&AiCoordinator> {
        self.coordinator.as_ref()
    }

    pub fn selected(&self) -> Option<&TerritoryId> {
        self.selected.as_ref()
    }
}

impl PointerInput for GameController {
    fn click(&mut self, x: f64, y: f64) {
        let hit = self
            .directory
            .territory_at(x, y)
            .map(|t| (t.id.clone(), t.owner));
        let Some((id, owner)) = hit else {
            // Clicking open water clears the selection.
            self.selected = None;
            return;
        };
        match self.phase.current() {
            GamePhase::Selection => {
                if let Err(e) = self.claim_start(&id, false) {
                    log::debug!("start claim on {id} ignored: {e}");
                }
            }
            GamePhase::Gameplay => {
                if owner == Owner::Player {
                    self.selected = Some(id);
                }
            }
            _ => {}
        }
    }

    fn right_click(&mut self, x: f64, y: f64) {
        if self.phase.current() != GamePhase::Gameplay {
            return;
        }
        let Some(source) = self.selected.clone() else {
            return;
        };
        let target = self
            .directory
            .territory_at(x, y)
            .filter(|t| t.owner != Owner::Player)
            .map(|t| t.id.clone());
        if let Some(target) = target {
            if let Err(e) = self.attack_territory(&source, &target) {
                log::debug!("attack {source} -> {target} rejected: {e}");
            }
        }
    }

    fn hover(&mut self, x: f64, y: f64) {
        self.hovered = self.directory.territory_at(x, y).map(|t| t.id.clone());
    }

    fn mouse_down(&mut self, x: f64, y: f64) -> Option<TerritoryId> {
        if self.phase.current() != GamePhase::Gameplay {
            return None;
        }
        let draggable = self
            .directory
            .territory_at(x, y)
            .filter(|t| t.owner == Owner::Player && t.troops > 1)
            .map(|t| t.id.clone());
        self.drag_source = draggable.clone();
        draggable
    }

    fn drag_start(&mut self, _x: f64, _y: f64) {
        // The highlight follows drag_source, already set on mouse_down.
    }

    fn drag(&mut self, x: f64, y: f64) {
        if self.phase.current() != GamePhase::Gameplay || self.drag_source.is_none() {
            return;
        }
        self.drag_target = self.directory.territory_at(x, y).map(|t| t.id.clone());
    }

    fn drop(&mut self, x: f64, y: f64) {
        if self.phase.current() != GamePhase::Gameplay {
            return;
        }
        let Some(source) = self.drag_source.take() else {
            return;
        };
        self.drag_target = None;
        let target = self
            .directory
            .territory_at(x, y)
            .filter(|t| t.owner != Owner::Player)
            .map(|t| t.id.clone());
        if let Some(target) = target {
            if let Err(e) = self.attack_territory(&source, &target) {
                log::debug!("drop attack {source} -> {target} rejected: {e}");
            }
        }
    }
}
