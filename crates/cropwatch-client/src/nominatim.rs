//! Nominatim-compatible geocoding adapter

use async_trait::async_trait;
use cropwatch_core::error::{CropwatchError, Result};
use cropwatch_core::models::{LngLat, PlaceKind, SearchCandidate};
use cropwatch_core::ports::Geocoder;
use serde::Deserialize;

const USER_AGENT: &str = concat!("cropwatch/", env!("CARGO_PKG_VERSION"));

/// Geocoder backed by a Nominatim `/search` endpoint
pub struct NominatimGeocoder {
    /// Search endpoint (e.g., "https://nominatim.openstreetmap.org/search")
    endpoint: String,

    /// HTTP client
    client: reqwest::Client,
}

impl NominatimGeocoder {
    /// Create a new geocoder for `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CropwatchError::ConfigInvalid {
                key: "geocode_endpoint".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { endpoint: endpoint.into(), client })
    }

    /// Create with the public OpenStreetMap endpoint
    pub fn openstreetmap() -> Result<Self> {
        Self::new(cropwatch_core::config::DEFAULT_GEOCODE_ENDPOINT)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn search_url(&self, query: &str, limit: usize) -> Result<reqwest::Url> {
        let limit = limit.to_string();
        reqwest::Url::parse_with_params(
            &self.endpoint,
            [("q", query), ("limit", limit.as_str()), ("format", "json")],
        )
        .map_err(|e| CropwatchError::ConfigInvalid {
            key: "geocode_endpoint".to_string(),
            reason: format!("Invalid URL '{}': {}", self.endpoint, e),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>> {
        let url = self.search_url(query, limit)?;
        tracing::debug!(query = %query, limit, "Geocoding lookup");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CropwatchError::network("Location search", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CropwatchError::network(
                "Location search",
                format!("geocoder error ({}): {}", status, error_text.trim()),
            ));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            CropwatchError::network("Location search", format!("unreadable response: {}", e))
        })?;

        Ok(into_candidates(places))
    }
}

/// Entries with unreadable coordinates are skipped, not fatal
fn into_candidates(places: Vec<NominatimPlace>) -> Vec<SearchCandidate> {
    places
        .into_iter()
        .filter_map(|place| {
            let label = place.display_name.clone();
            match place.into_candidate() {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    tracing::warn!(place = %label, error = %e, "Skipping geocoder result");
                    None
                }
            }
        })
        .collect()
}

/// One entry of a Nominatim `format=json` response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Coordinate,
    lon: Coordinate,
    display_name: String,
    #[serde(rename = "type", default)]
    kind: String,
    /// Newer servers classify admin boundaries here ("country", "state")
    /// while `type` just says "administrative"
    #[serde(default)]
    addresstype: Option<String>,
    #[serde(default)]
    place_id: Option<serde_json::Value>,
}

/// Nominatim encodes coordinates as strings; other servers use numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self, name: &str) -> Result<f64> {
        match self {
            Coordinate::Number(n) => Ok(*n),
            Coordinate::Text(s) => s.trim().parse().map_err(|_| {
                CropwatchError::network("Location search", format!("invalid {} '{}'", name, s))
            }),
        }
    }
}

impl NominatimPlace {
    fn into_candidate(self) -> Result<SearchCandidate> {
        let coordinate = LngLat::new(self.lon.value("lon")?, self.lat.value("lat")?);
        let tag = self.addresstype.as_deref().unwrap_or(&self.kind);

        Ok(SearchCandidate {
            kind: PlaceKind::from_tag(tag),
            label: self.display_name,
            coordinate,
            place_id: self.place_id.map(|id| match id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let geocoder = NominatimGeocoder::new("https://geo.example.org/search").unwrap();
        let url = geocoder.search_url("Bandung, Jawa Barat", 5).unwrap();
        assert_eq!(url.host_str(), Some("geo.example.org"));
        let query = url.query().unwrap();
        assert!(query.contains("q=Bandung%2C+Jawa+Barat"));
        assert!(query.contains("limit=5"));
        assert!(query.contains("format=json"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let geocoder = NominatimGeocoder::new("not a url").unwrap();
        assert!(geocoder.search_url("x", 1).is_err());
    }

    #[test]
    fn test_parse_nominatim_response() {
        let body = r#"[
            {"place_id": 297823, "lat": "-2.4833826", "lon": "117.8902853",
             "display_name": "Indonesia", "class": "boundary", "type": "administrative",
             "addresstype": "country"},
            {"place_id": "abc", "lat": -6.9175, "lon": 107.6191,
             "display_name": "Bandung, West Java, Java, Indonesia", "type": "city"}
        ]"#;

        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        let candidates: Vec<SearchCandidate> =
            places.into_iter().map(|p| p.into_candidate().unwrap()).collect();

        assert_eq!(candidates[0].kind, PlaceKind::Country);
        assert_eq!(candidates[0].place_id.as_deref(), Some("297823"));
        assert!((candidates[0].coordinate.lng - 117.8902853).abs() < 1e-9);

        assert_eq!(candidates[1].kind, PlaceKind::Locality);
        assert_eq!(candidates[1].short_label(), "Bandung");
        assert_eq!(candidates[1].place_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_bad_coordinate_text() {
        let place: NominatimPlace = serde_json::from_str(
            r#"{"lat": "north", "lon": "1.0", "display_name": "Nowhere", "type": "city"}"#,
        )
        .unwrap();
        assert!(place.into_candidate().is_err());
    }

    #[test]
    fn test_bad_entry_does_not_sink_lookup() {
        let body = r#"[
            {"lat": "north", "lon": "1.0", "display_name": "Nowhere", "type": "city"},
            {"lat": "-6.9175", "lon": "107.6191", "display_name": "Bandung, Indonesia", "type": "city"}
        ]"#;

        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        let candidates = into_candidates(places);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].short_label(), "Bandung");
    }
}
