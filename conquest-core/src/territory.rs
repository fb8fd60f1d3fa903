//! The territory entity: the atomic unit of control.

use crate::geometry::{Bounds, Geometry, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable territory identifier (an ISO-style code from the map source, or a
/// synthesized slug for features without one).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerritoryId(pub String);

impl TerritoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TerritoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TerritoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who controls a territory.
///
/// All AI agents fight under one collective banner: they never contest each
/// other's holdings, and win/lose accounting only distinguishes the player
/// from everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    Neutral,
    Player,
    Ai,
}

impl Owner {
    pub fn is_neutral(&self) -> bool {
        matches!(self, Owner::Neutral)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Owner::Neutral => "neutral",
            Owner::Player => "player",
            Owner::Ai => "ai",
        }
    }
}

/// Parsed map record handed to the directory by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapRecord {
    pub id: String,
    pub name: String,
    pub geometry: Geometry,
}

/// A map region with ownership, garrison, adjacency and outline.
///
/// Geometry is immutable after load; centroid and bounds are derived once at
/// construction. Owner and troops are the only fields that change during a
/// session, and territories are never destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub owner: Owner,
    pub troops: u32,
    /// Ids of adjacent territories. Symmetric: if A lists B, B lists A.
    pub neighbors: Vec<TerritoryId>,
    pub geometry: Arc<Geometry>,
    pub centroid: Point,
    pub bounds: Bounds,
}

impl Territory {
    pub fn new(record: MapRecord, troops: u32) -> Self {
        let centroid = record.geometry.centroid();
        let bounds = record.geometry.bounds();
        Self {
            id: TerritoryId::new(record.id),
            name: record.name,
            owner: Owner::Neutral,
            troops,
            neighbors: Vec::new(),
            geometry: Arc::new(record.geometry),
            centroid,
            bounds,
        }
    }

    pub fn add_troops(&mut self, amount: u32) {
        self.troops = self.troops.saturating_add(amount);
    }

    /// Remove troops, flooring at zero.
    pub fn remove_troops(&mut self, amount: u32) {
        self.troops = self.troops.saturating_sub(amount);
    }

    pub fn set_owner(&mut self, owner: Owner) {
        self.owner = owner;
    }

    pub fn is_neighbor(&self, id: &TerritoryId) -> bool {
        self.neighbors.contains(id)
    }

    /// World-space containment, with a bounds pre-check before the ray cast.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.bounds.contains(x, y) && self.geometry.contains(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::square_record;

    #[test]
    fn test_derived_fields() {
        let t = Territory::new(square_record("abc", 4.0, 6.0), 7);
        assert_eq!(t.owner, Owner::Neutral);
        assert_eq!(t.troops, 7);
        assert!((t.centroid.x - 4.0).abs() < 1e-9);
        assert!((t.centroid.y - 6.0).abs() < 1e-9);
        assert!(t.contains_point(4.5, 5.5));
        assert!(!t.contains_point(40.0, 6.0));
    }

    #[test]
    fn test_troops_floor_at_zero() {
        let mut t = Territory::new(square_record("abc", 0.0, 0.0), 3);
        t.remove_troops(10);
        assert_eq!(t.troops, 0);
        t.add_troops(2);
        assert_eq!(t.troops, 2);
    }
}
