//! Planar geometry for territory outlines.
//!
//! Coordinates are the map source's geographic world units (longitude,
//! latitude). The renderer owns any screen projection; everything here works
//! in world space, which is also the space pointer events arrive in.

use serde::{Deserialize, Serialize};

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A closed ring of vertices. The closing edge from the last vertex back to
/// the first is implicit.
pub type Ring = Vec<Point>;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// An inverted box that any real vertex will expand.
    fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn expand(&mut self, p: &Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Smallest box covering both.
    pub fn merge(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        }
    }
}

/// A territory outline: one polygon or several disjoint ones (islands,
/// exclaves).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match self {
            Geometry::Polygon(rings) => Box::new(rings.iter()),
            Geometry::MultiPolygon(polygons) => Box::new(polygons.iter().flatten()),
        }
    }

    /// True when the outline carries no vertices at all.
    pub fn is_empty(&self) -> bool {
        self.rings().all(|r| r.is_empty())
    }

    /// Arithmetic mean of every vertex across every ring. Cheap and stable;
    /// not an area-weighted centroid, but distances between these are what
    /// the adjacency and cost models were tuned against.
    pub fn centroid(&self) -> Point {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut count = 0usize;
        for ring in self.rings() {
            for p in ring {
                sum_x += p.x;
                sum_y += p.y;
                count += 1;
            }
        }
        if count == 0 {
            return Point::default();
        }
        Point::new(sum_x / count as f64, sum_y / count as f64)
    }

    /// Envelope over every vertex.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        let mut any = false;
        for ring in self.rings() {
            for p in ring {
                bounds.expand(p);
                any = true;
            }
        }
        if any {
            bounds
        } else {
            Bounds::default()
        }
    }

    /// Even-odd containment test. A polygon contains the point when any of
    /// its rings does; a multi-polygon when any constituent polygon does.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            Geometry::Polygon(rings) => rings.iter().any(|r| point_in_ring(x, y, r)),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .any(|rings| rings.iter().any(|r| point_in_ring(x, y, r))),
        }
    }
}

/// Even-odd ray cast against one ring.
fn point_in_ring(x: f64, y: f64, ring: &Ring) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
