//! AOI metrics and conversions to `geo` types

use cropwatch_core::models::{LngLat, MapView, Polygon};
use geo::{BoundingRect, Centroid, GeodesicArea};
use serde::Serialize;

const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Summary of an area of interest
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AoiMetrics {
    pub area_hectares: f64,
    /// `[min_lng, min_lat, max_lng, max_lat]`
    pub bbox: [f64; 4],
    pub centroid: LngLat,
}

/// Convert a canonical polygon to a `geo::Polygon` (x = lng, y = lat)
pub fn to_geo_polygon(polygon: &Polygon) -> geo::Polygon<f64> {
    let exterior: Vec<(f64, f64)> = polygon.ring().iter().map(|p| (p[0], p[1])).collect();
    geo::Polygon::new(geo::LineString::from(exterior), vec![])
}

/// Geodesic area, bounding box, and centroid of an AOI
pub fn aoi_metrics(polygon: &Polygon) -> AoiMetrics {
    let geo_polygon = to_geo_polygon(polygon);

    let bbox = geo_polygon
        .bounding_rect()
        .map(|rect| [rect.min().x, rect.min().y, rect.max().x, rect.max().y])
        .unwrap_or_else(|| polygon.bbox());

    let centroid = geo_polygon
        .centroid()
        .map(|p| LngLat::new(p.x(), p.y()))
        .unwrap_or_else(|| LngLat::new((bbox[0] + bbox[2]) / 2.0, (bbox[1] + bbox[3]) / 2.0));

    AoiMetrics {
        area_hectares: geo_polygon.geodesic_area_unsigned() / SQUARE_METERS_PER_HECTARE,
        bbox,
        centroid,
    }
}

/// Camera view that frames the whole AOI
pub fn fit_view(polygon: &Polygon) -> MapView {
    let metrics = aoi_metrics(polygon);
    let [min_lng, min_lat, max_lng, max_lat] = metrics.bbox;
    let extent = (max_lng - min_lng).max(max_lat - min_lat);

    let zoom = if extent <= 0.0 {
        18.0
    } else {
        (360.0 / extent).log2().floor().clamp(2.0, 18.0)
    };

    MapView { center: metrics.centroid, zoom: zoom as u8 }
}
