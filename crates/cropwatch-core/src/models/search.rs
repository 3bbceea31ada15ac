//! Location search and map view models

use super::geometry::LngLat;
use serde::{Deserialize, Serialize};

/// Place classification reported by the geocoder, used to pick a zoom level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaceKind {
    Country,
    State,
    Region,
    Locality,
    #[default]
    Other,
}

impl PlaceKind {
    /// Classify a geocoder `type` tag
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "country" => PlaceKind::Country,
            "state" | "province" => PlaceKind::State,
            "region" | "county" | "state_district" => PlaceKind::Region,
            "city" | "town" | "village" | "hamlet" | "locality" | "suburb" | "municipality" => {
                PlaceKind::Locality
            }
            _ => PlaceKind::Other,
        }
    }
}

/// Zoom levels applied when centering the map on a selected place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomLevels {
    pub coarse: u8,
    pub medium: u8,
    pub close: u8,
}

impl Default for ZoomLevels {
    fn default() -> Self {
        Self { coarse: 4, medium: 7, close: 13 }
    }
}

impl ZoomLevels {
    pub fn for_kind(&self, kind: &PlaceKind) -> u8 {
        match kind {
            PlaceKind::Country => self.coarse,
            PlaceKind::State | PlaceKind::Region => self.medium,
            PlaceKind::Locality | PlaceKind::Other => self.close,
        }
    }
}

/// A geocoder match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Full display name, e.g. "Bandung, West Java, Java, Indonesia"
    pub label: String,
    pub coordinate: LngLat,
    pub kind: PlaceKind,
    pub place_id: Option<String>,
}

impl SearchCandidate {
    pub fn new(label: impl Into<String>, coordinate: LngLat, kind: PlaceKind) -> Self {
        Self { label: label.into(), coordinate, kind, place_id: None }
    }

    /// First comma-delimited segment of the full label
    pub fn short_label(&self) -> &str {
        self.label.split(',').next().map(str::trim).unwrap_or_default()
    }
}

/// Target camera position for an animated map transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: LngLat,
    pub zoom: u8,
}

/// Tile overlay produced by a completed analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    pub url: String,
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_kind_from_tag() {
        assert_eq!(PlaceKind::from_tag("country"), PlaceKind::Country);
        assert_eq!(PlaceKind::from_tag("State"), PlaceKind::State);
        assert_eq!(PlaceKind::from_tag("county"), PlaceKind::Region);
        assert_eq!(PlaceKind::from_tag("city"), PlaceKind::Locality);
        assert_eq!(PlaceKind::from_tag("farmland"), PlaceKind::Other);
    }

    #[test]
    fn test_country_zooms_coarser_than_locality() {
        let zoom = ZoomLevels::default();
        assert!(zoom.for_kind(&PlaceKind::Country) < zoom.for_kind(&PlaceKind::State));
        assert!(zoom.for_kind(&PlaceKind::State) < zoom.for_kind(&PlaceKind::Locality));
        assert_eq!(zoom.for_kind(&PlaceKind::Other), zoom.close);
    }

    #[test]
    fn test_short_label() {
        let candidate = SearchCandidate::new(
            "Bandung, West Java, Java, Indonesia",
            LngLat::new(107.6, -6.9),
            PlaceKind::Locality,
        );
        assert_eq!(candidate.short_label(), "Bandung");

        let single = SearchCandidate::new("Kenya", LngLat::new(38.0, 0.0), PlaceKind::Country);
        assert_eq!(single.short_label(), "Kenya");
    }
}
