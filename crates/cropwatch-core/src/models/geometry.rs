//! Canonical area-of-interest geometry.
//!
//! Every drawing backend is normalized into a [`Polygon`]: one closed ring of
//! `[lng, lat]` positions in GeoJSON axis order.

use crate::error::{CropwatchError, Result};
use serde::{Deserialize, Serialize};

/// A single position in GeoJSON axis order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn to_position(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Identifier a drawing backend assigns to a shape on the map
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeId(pub String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed polygon ring in `[lng, lat]` order.
///
/// Invariants: the first and last positions are equal, there are at least
/// three distinct vertices, and all coordinates are finite and within
/// WGS 84 bounds. Self-intersection is not checked here. Instances are
/// immutable; edits produce a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    ring: Vec<[f64; 2]>,
}

impl Polygon {
    /// Minimum number of distinct vertices in a ring
    pub const MIN_VERTICES: usize = 3;

    /// Build a polygon from vertices, appending the first vertex when the
    /// ring is not already closed.
    pub fn from_vertices(vertices: Vec<LngLat>) -> Result<Self> {
        if let Some((idx, bad)) = vertices.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(CropwatchError::InvalidGeometry {
                reason: format!("vertex {} has non-finite coordinates ({}, {})", idx, bad.lng, bad.lat),
            });
        }

        if let Some((idx, bad)) = vertices
            .iter()
            .enumerate()
            .find(|(_, v)| !(-180.0..=180.0).contains(&v.lng) || !(-90.0..=90.0).contains(&v.lat))
        {
            return Err(CropwatchError::InvalidGeometry {
                reason: format!(
                    "vertex {} is outside WGS 84 bounds (lng {}, lat {})",
                    idx, bad.lng, bad.lat
                ),
            });
        }

        let mut ring: Vec<[f64; 2]> = vertices.into_iter().map(LngLat::to_position).collect();

        let distinct = count_distinct(&ring);
        if distinct < Self::MIN_VERTICES {
            return Err(CropwatchError::InvalidGeometry {
                reason: format!(
                    "polygon needs at least {} distinct vertices, found {}",
                    Self::MIN_VERTICES,
                    distinct
                ),
            });
        }

        if ring.first() != ring.last() {
            ring.push(ring[0]);
        }

        Ok(Self { ring })
    }

    /// Build a polygon from raw `[lng, lat]` positions
    pub fn from_positions(positions: &[[f64; 2]]) -> Result<Self> {
        Self::from_vertices(positions.iter().map(|p| LngLat::new(p[0], p[1])).collect())
    }

    /// The closed ring, including the repeated closing position
    pub fn ring(&self) -> &[[f64; 2]] {
        &self.ring
    }

    /// Vertices without the closing repetition
    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.ring[..self.ring.len() - 1]
    }

    pub fn vertex_count(&self) -> usize {
        self.ring.len() - 1
    }

    /// Bounding box as `[min_lng, min_lat, max_lng, max_lat]`
    pub fn bbox(&self) -> [f64; 4] {
        self.ring.iter().fold(
            [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
            |acc, p| [acc[0].min(p[0]), acc[1].min(p[1]), acc[2].max(p[0]), acc[3].max(p[1])],
        )
    }

    /// GeoJSON `Polygon` geometry object, as sent in `aoi_geojson`
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [self.ring],
        })
    }
}

impl<'de> Deserialize<'de> for Polygon {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            ring: Vec<[f64; 2]>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Polygon::from_positions(&raw.ring).map_err(serde::de::Error::custom)
    }
}

fn count_distinct(positions: &[[f64; 2]]) -> usize {
    let mut seen: Vec<[f64; 2]> = Vec::with_capacity(positions.len());
    for p in positions {
        if !seen.contains(p) {
            seen.push(*p);
        }
    }
    seen.len()
}
