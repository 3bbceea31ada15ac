//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod credentials;
pub mod geocode;
pub mod jobs;
pub mod map;

pub use credentials::CredentialProvider;
pub use geocode::Geocoder;
pub use jobs::JobApi;
pub use map::MapSurface;
