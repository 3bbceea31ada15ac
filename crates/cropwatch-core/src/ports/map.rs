use crate::models::{MapView, Overlay, ShapeId};

/// Capability set shared by every map-drawing backend.
///
/// Tile-based and provider-based widgets both implement this; drawing
/// normalization and the analysis flow only ever talk to the trait.
/// Methods take `&self` because widgets are driven through shared handles.
pub trait MapSurface: Send + Sync {
    /// Render base tiles from a `{z}/{x}/{y}` URL template
    fn set_base_layer(&self, url_template: &str);

    /// Start an animated transition to `view`
    fn fly_to(&self, view: MapView);

    /// Abort any pending animated transition
    fn cancel_transition(&self);

    /// Show, hide, or remove the analysis overlay
    fn set_overlay(&self, overlay: Option<&Overlay>);

    /// Remove one drawn shape from the map
    fn remove_shape(&self, id: &ShapeId);

    /// Remove every drawn shape from the map
    fn clear_shapes(&self);
}
