//! Drawn shape normalization and the one-active-polygon drawing session

use std::sync::Arc;

use cropwatch_core::error::{CropwatchError, Result};
use cropwatch_core::models::{Polygon, ShapeId};
use cropwatch_core::ports::MapSurface;
use geo::Area;

use crate::metrics::to_geo_polygon;
use crate::shapes::NativeShape;

/// Convert a native drawn shape into a closed `[lng, lat]` ring.
///
/// Vertices keep the backend's order. The ring is closed by repeating the
/// first vertex when needed. Rings with fewer than three distinct vertices or
/// zero planar area are rejected.
pub fn normalize(shape: &dyn NativeShape) -> Result<Polygon> {
    let vertices = shape.vertices()?;
    let polygon = Polygon::from_vertices(vertices)?;

    if to_geo_polygon(&polygon).unsigned_area() == 0.0 {
        return Err(CropwatchError::InvalidGeometry {
            reason: format!("shape {} encloses no area", shape.shape_id()),
        });
    }

    Ok(polygon)
}

/// Event emitted by a map-drawing backend
pub enum DrawEvent {
    Created(Box<dyn NativeShape>),
    Edited(Box<dyn NativeShape>),
    Deleted(ShapeId),
}

type PolygonCallback = Box<dyn Fn(Option<Polygon>) + Send + Sync>;

/// Tracks the single active drawn shape and reports polygon changes.
///
/// Every produced polygon, and every transition to "no AOI", is reported
/// through one callback. Drawing a second shape removes the first from the
/// map before the callback fires.
pub struct DrawingSession {
    map: Arc<dyn MapSurface>,
    active: Option<ShapeId>,
    on_change: PolygonCallback,
}

impl DrawingSession {
    pub fn new<F>(map: Arc<dyn MapSurface>, on_change: F) -> Self
    where
        F: Fn(Option<Polygon>) + Send + Sync + 'static,
    {
        Self { map, active: None, on_change: Box::new(on_change) }
    }

    /// The shape currently defining the AOI, if any
    pub fn active_shape(&self) -> Option<&ShapeId> {
        self.active.as_ref()
    }

    /// Apply one drawing event.
    ///
    /// An invalid created shape is removed from the map and the previous AOI
    /// stays in place. An invalid edit also leaves the previous AOI.
    pub fn handle(&mut self, event: DrawEvent) -> Result<()> {
        match event {
            DrawEvent::Created(shape) => self.created(shape.as_ref()),
            DrawEvent::Edited(shape) => self.edited(shape.as_ref()),
            DrawEvent::Deleted(id) => {
                self.deleted(&id);
                Ok(())
            }
        }
    }

    /// Remove every drawn shape and report "no AOI"
    pub fn clear(&mut self) {
        self.map.clear_shapes();
        if self.active.take().is_some() {
            (self.on_change)(None);
        }
    }

    fn created(&mut self, shape: &dyn NativeShape) -> Result<()> {
        let id = shape.shape_id();
        let polygon = match normalize(shape) {
            Ok(polygon) => polygon,
            Err(e) => {
                tracing::warn!(shape = %id, error = %e, "Discarding invalid drawn shape");
                self.map.remove_shape(&id);
                return Err(e);
            }
        };

        if let Some(previous) = self.active.take() {
            if previous != id {
                tracing::debug!(previous = %previous, replacement = %id, "Replacing active shape");
                self.map.remove_shape(&previous);
            }
        }

        tracing::debug!(shape = %id, vertices = polygon.vertex_count(), "AOI drawn");
        self.active = Some(id);
        (self.on_change)(Some(polygon));
        Ok(())
    }

    fn edited(&mut self, shape: &dyn NativeShape) -> Result<()> {
        let id = shape.shape_id();
        if self.active.as_ref() != Some(&id) {
            tracing::debug!(shape = %id, "Ignoring edit of inactive shape");
            return Ok(());
        }

        let polygon = normalize(shape)?;
        tracing::debug!(shape = %id, vertices = polygon.vertex_count(), "AOI edited");
        (self.on_change)(Some(polygon));
        Ok(())
    }

    fn deleted(&mut self, id: &ShapeId) {
        if self.active.as_ref() == Some(id) {
            tracing::debug!(shape = %id, "AOI deleted");
            self.active = None;
            (self.on_change)(None);
        }
    }
}
