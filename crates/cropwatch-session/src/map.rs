//! Map surface without a renderer

use std::sync::{Mutex, MutexGuard, PoisonError};

use cropwatch_core::models::{MapView, Overlay, ShapeId};
use cropwatch_core::ports::MapSurface;

/// Records what a map widget would display.
///
/// Used by the command line front end, where there is no widget to drive,
/// and by tests to observe map side effects.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    state: Mutex<HeadlessState>,
}

#[derive(Debug, Default, Clone)]
struct HeadlessState {
    base_layer: Option<String>,
    view: Option<MapView>,
    transitions: Vec<MapView>,
    cancelled_transitions: usize,
    overlay: Option<Overlay>,
    removed_shapes: Vec<ShapeId>,
    clears: usize,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn base_layer(&self) -> Option<String> {
        self.lock().base_layer.clone()
    }

    /// Target of the most recent transition, unless it was cancelled
    pub fn view(&self) -> Option<MapView> {
        self.lock().view
    }

    /// Every transition requested so far
    pub fn transitions(&self) -> Vec<MapView> {
        self.lock().transitions.clone()
    }

    pub fn cancelled_transitions(&self) -> usize {
        self.lock().cancelled_transitions
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.lock().overlay.clone()
    }

    pub fn removed_shapes(&self) -> Vec<ShapeId> {
        self.lock().removed_shapes.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.lock().clears
    }
}

impl MapSurface for HeadlessMap {
    fn set_base_layer(&self, url_template: &str) {
        tracing::debug!(tiles = %url_template, "Base layer set");
        self.lock().base_layer = Some(url_template.to_string());
    }

    fn fly_to(&self, view: MapView) {
        tracing::info!(
            lng = view.center.lng,
            lat = view.center.lat,
            zoom = view.zoom,
            "Map transition"
        );
        let mut state = self.lock();
        state.view = Some(view);
        state.transitions.push(view);
    }

    fn cancel_transition(&self) {
        let mut state = self.lock();
        state.view = None;
        state.cancelled_transitions += 1;
    }

    fn set_overlay(&self, overlay: Option<&Overlay>) {
        match overlay {
            Some(o) => tracing::info!(url = %o.url, visible = o.visible, "Analysis overlay set"),
            None => tracing::debug!("Analysis overlay removed"),
        }
        self.lock().overlay = overlay.cloned();
    }

    fn remove_shape(&self, id: &ShapeId) {
        self.lock().removed_shapes.push(id.clone());
    }

    fn clear_shapes(&self) {
        self.lock().clears += 1;
    }
}
