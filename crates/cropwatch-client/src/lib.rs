//! Cropwatch Client - Adapters for the job API and geocoding
//!
//! HTTP adapters talk to the analysis backend and a Nominatim-compatible
//! geocoder. The in-memory adapters serve development and tests.

pub mod credentials;
pub mod http;
pub mod memory;
pub mod nominatim;

pub use credentials::{EnvCredentials, NoCredentials, StaticCredentials};
pub use http::HttpJobApi;
pub use memory::{MemoryGeocoder, MemoryJobApi};
pub use nominatim::NominatimGeocoder;
