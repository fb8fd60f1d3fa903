//! Read-only render boundary.
//!
//! Once per frame the controller publishes a [`RenderState`]: everything the
//! excluded rendering collaborator needs to draw, and nothing it could
//! mutate. Geometry is shared by `Arc`, so building a view is cheap even
//! with detailed outlines.

use crate::combat::AttackEvent;
use crate::geometry::{Bounds, Geometry, Point};
use crate::phase::GamePhase;
use crate::territory::{Owner, Territory, TerritoryId};
use serde::Serialize;
use std::sync::Arc;

/// One territory as the renderer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct TerritoryView {
    pub id: TerritoryId,
    pub name: String,
    pub owner: Owner,
    pub troops: u32,
    pub centroid: Point,
    pub bounds: Bounds,
    pub geometry: Arc<Geometry>,
}

impl From<&Territory> for TerritoryView {
    fn from(t: &Territory) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            owner: t.owner,
            troops: t.troops,
            centroid: t.centroid,
            bounds: t.bounds,
            geometry: Arc::clone(&t.geometry),
        }
    }
}

/// The per-frame state snapshot handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RenderState {
    pub phase: GamePhase,
    pub territories: Vec<TerritoryView>,

    // Highlights
    pub selected: Option<TerritoryId>,
    pub hovered: Option<TerritoryId>,
    pub drag_source: Option<TerritoryId>,
    pub drag_target: Option<TerritoryId>,

    /// Attacks still within their display window.
    pub attacks: Vec<AttackEvent>,

    /// Seconds until the next production grant (ceiling).
    pub production_countdown_s: u32,
    /// Milliseconds left to pick a starting territory; 0 outside SELECTION.
    pub selection_remaining_ms: u64,

    pub paused: bool,
    pub speed: f64,

    // Side tallies for status displays.
    pub player_territories: usize,
    pub ai_territories: usize,
    pub neutral_territories: usize,
}

impl RenderState {
    /// Envelope around every territory, for camera fitting. `None` on an
    /// unloaded map.
    pub fn world_bounds(&self) -> Option<Bounds> {
        self.territories
            .iter()
            .map(|t| t.bounds)
            .reduce(|a, b| a.merge(&b))
    }
}
