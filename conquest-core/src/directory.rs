//! Territory directory: exclusive owner of the territory collection, the
//! adjacency graph and the point-location scan.
//!
//! Adjacency uses a flat centroid-distance threshold rather than true
//! polygon-boundary touching. That is an approximation the rest of the
//! balance was tuned against, so it is kept as-is; see the threshold note on
//! [`crate::config::GameConfig::neighbor_distance`].

use crate::territory::{MapRecord, Owner, Territory, TerritoryId};
use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("map source contained no territories")]
    Empty,
    #[error("territory {0} has no usable geometry")]
    MalformedGeometry(String),
}

/// Owns every [`Territory`]. No other component adds or removes entries;
/// combat and production mutate owner/troop fields through `get_mut`.
#[derive(Debug, Default)]
pub struct TerritoryDirectory {
    territories: FxHashMap<TerritoryId, Territory>,
    /// Insertion order: the point-location scan order and the deterministic
    /// iteration order for everything downstream (AI tie-breaks included).
    order: Vec<TerritoryId>,
}

impl TerritoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-construct territories from parsed map records. Every territory
    /// starts neutral with a garrison rolled uniformly from
    /// `[troops_min, troops_max)`.
    ///
    /// Fails on empty input or a record without geometry; the caller owns
    /// any retry/fallback policy, the directory does not retry.
    pub fn load(
        &mut self,
        records: &[MapRecord],
        troops_min: u32,
        troops_max: u32,
        rng: &mut StdRng,
    ) -> Result<(), LoadError> {
        if records.is_empty() {
            return Err(LoadError::Empty);
        }
        self.territories.clear();
        self.order.clear();
        for record in records {
            if record.geometry.is_empty() {
                return Err(LoadError::MalformedGeometry(record.id.clone()));
            }
            let troops = rng.gen_range(troops_min..troops_max);
            let territory = Territory::new(record.clone(), troops);
            self.order.push(territory.id.clone());
            self.territories.insert(territory.id.clone(), territory);
        }
        log::info!("loaded {} territories", self.order.len());
        Ok(())
    }

    /// O(n²) pairwise centroid-distance test. Symmetric by construction.
    pub fn build_adjacency(&mut self, threshold: f64) {
        for id in &self.order {
            if let Some(t) = self.territories.get_mut(id) {
                t.neighbors.clear();
            }
        }
        let ids = self.order.clone();
        let mut links = 0usize;
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let (a, b) = (&ids[i], &ids[j]);
                let close = match (self.territories.get(a), self.territories.get(b)) {
                    (Some(ta), Some(tb)) => ta.centroid.distance(&tb.centroid) < threshold,
                    _ => false,
                };
                if close {
                    if let Some(ta) = self.territories.get_mut(a) {
                        ta.neighbors.push(b.clone());
                    }
                    if let Some(tb) = self.territories.get_mut(b) {
                        tb.neighbors.push(a.clone());
                    }
                    links += 1;
                }
            }
        }
        log::debug!("adjacency graph built: {links} links");
    }

    /// Point location: linear scan in load order, first containment hit.
    /// Tie-break between overlapping outlines is unspecified (none expected
    /// in real map data).
    pub fn territory_at(&self, x: f64, y: f64) -> Option<&Territory> {
        self.order
            .iter()
            .filter_map(|id| self.territories.get(id))
            .find(|t| t.contains_point(x, y))
    }

    pub fn get(&self, id: &TerritoryId) -> Option<&Territory> {
        self.territories.get(id)
    }

    pub fn get_mut(&mut self, id: &TerritoryId) -> Option<&mut Territory> {
        self.territories.get_mut(id)
    }

    /// All territories in load order.
    pub fn all(&self) -> impl Iterator<Item = &Territory> {
        self.order.iter().filter_map(|id| self.territories.get(id))
    }

    pub fn by_owner(&self, owner: Owner) -> Vec<&Territory> {
        self.all().filter(|t| t.owner == owner).collect()
    }

    pub fn count_owned(&self, owner: Owner) -> usize {
        self.all().filter(|t| t.owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Deterministic digest of the mutable state (ownership and garrisons),
    /// iterated in sorted id order. Identical runs produce identical
    /// checksums; used to assert reproducibility.
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        let mut ids: Vec<_> = self.order.clone();
        ids.sort();
        for id in ids {
            if let Some(t) = self.territories.get(&id) {
                id.hash(&mut hasher);
                t.owner.hash(&mut hasher);
                t.troops.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}
