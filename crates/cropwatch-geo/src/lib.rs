//! Cropwatch Geo - Drawn shape normalization and AOI geometry
//!
//! This crate turns shapes from any map-drawing backend into the canonical
//! closed-ring [`Polygon`](cropwatch_core::models::Polygon), enforces the
//! one-active-polygon rule, and computes AOI metrics with the `geo` crate.

pub mod metrics;
pub mod normalize;
pub mod shapes;

pub use metrics::{aoi_metrics, fit_view, to_geo_polygon, AoiMetrics};
pub use normalize::{normalize, DrawEvent, DrawingSession};
pub use shapes::{GeoJsonShape, LatLng, NativeShape, ProviderPolygon, TilePolygon};
