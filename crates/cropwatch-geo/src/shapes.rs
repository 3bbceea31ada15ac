//! Native drawn-shape adapters.
//!
//! Each drawing backend hands out shapes in its own representation. The
//! tile-based widget and the map provider both store `(lat, lng)`; GeoJSON
//! draw plugins already emit `[lng, lat]`. Every adapter yields vertices in
//! canonical `[lng, lat]` order.

use cropwatch_core::error::{CropwatchError, Result};
use cropwatch_core::models::{LngLat, ShapeId};
use serde::{Deserialize, Serialize};

/// A shape as emitted by a drawing backend
pub trait NativeShape: Send + Sync {
    /// Identifier the backend assigned to the shape
    fn shape_id(&self) -> ShapeId;

    /// Vertices in the backend's native order, converted to `[lng, lat]`
    fn vertices(&self) -> Result<Vec<LngLat>>;
}

/// `(lat, lng)` pair as stored by the tile-based widget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Polygon from the tile-based drawing widget.
///
/// Rings are nested the way the widget returns them; the first ring is the
/// outer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePolygon {
    pub id: ShapeId,
    pub latlngs: Vec<Vec<LatLng>>,
}

impl TilePolygon {
    pub fn new(id: impl Into<String>, outer: Vec<LatLng>) -> Self {
        Self { id: ShapeId::new(id), latlngs: vec![outer] }
    }
}

impl NativeShape for TilePolygon {
    fn shape_id(&self) -> ShapeId {
        self.id.clone()
    }

    fn vertices(&self) -> Result<Vec<LngLat>> {
        let outer = self.latlngs.first().ok_or_else(|| CropwatchError::InvalidGeometry {
            reason: format!("shape {} has no rings", self.id),
        })?;
        Ok(outer.iter().map(|p| LngLat::new(p.lng, p.lat)).collect())
    }
}

/// Polygon path from the map provider's drawing manager.
///
/// The provider exposes a flat path of `(lat, lng)` tuples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPolygon {
    pub id: ShapeId,
    pub path: Vec<(f64, f64)>,
}

impl ProviderPolygon {
    pub fn new(id: impl Into<String>, path: Vec<(f64, f64)>) -> Self {
        Self { id: ShapeId::new(id), path }
    }
}

impl NativeShape for ProviderPolygon {
    fn shape_id(&self) -> ShapeId {
        self.id.clone()
    }

    fn vertices(&self) -> Result<Vec<LngLat>> {
        Ok(self.path.iter().map(|&(lat, lng)| LngLat::new(lng, lat)).collect())
    }
}

/// GeoJSON `Polygon` geometry, or a `Feature` wrapping one
#[derive(Debug, Clone)]
pub struct GeoJsonShape {
    pub id: ShapeId,
    pub geojson: geojson::GeoJson,
}

impl GeoJsonShape {
    pub fn new(id: impl Into<String>, geojson: geojson::GeoJson) -> Self {
        Self { id: ShapeId::new(id), geojson }
    }

    /// Parse GeoJSON text
    pub fn parse(id: impl Into<String>, content: &str) -> Result<Self> {
        let geojson: geojson::GeoJson = content
            .parse()
            .map_err(|e| CropwatchError::InvalidGeometry { reason: format!("invalid GeoJSON: {}", e) })?;
        Ok(Self::new(id, geojson))
    }

    fn geometry(&self) -> Option<&geojson::Geometry> {
        match &self.geojson {
            geojson::GeoJson::Geometry(geometry) => Some(geometry),
            geojson::GeoJson::Feature(feature) => feature.geometry.as_ref(),
            geojson::GeoJson::FeatureCollection(collection) => collection
                .features
                .iter()
                .filter_map(|f| f.geometry.as_ref())
                .find(|g| matches!(g.value, geojson::Value::Polygon(_))),
        }
    }
}

impl NativeShape for GeoJsonShape {
    fn shape_id(&self) -> ShapeId {
        self.id.clone()
    }

    fn vertices(&self) -> Result<Vec<LngLat>> {
        let geometry = self.geometry().ok_or_else(|| CropwatchError::InvalidGeometry {
            reason: "GeoJSON contains no geometry".to_string(),
        })?;

        let rings = match &geometry.value {
            geojson::Value::Polygon(rings) => rings,
            _ => {
                return Err(CropwatchError::InvalidGeometry {
                    reason: "aoi_geojson must be a GeoJSON Polygon or Feature".to_string(),
                })
            }
        };

        let outer = rings.first().ok_or_else(|| CropwatchError::InvalidGeometry {
            reason: "polygon has no exterior ring".to_string(),
        })?;

        outer
            .iter()
            .enumerate()
            .map(|(idx, position)| match (position.first(), position.get(1)) {
                (Some(&lng), Some(&lat)) => Ok(LngLat::new(lng, lat)),
                _ => Err(CropwatchError::InvalidGeometry {
                    reason: format!("position {} has fewer than two coordinates", idx),
                }),
            })
            .collect()
    }
}
