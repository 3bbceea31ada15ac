//! Cropwatch Core - Domain models, configuration, and port definitions
//!
//! This crate contains the shared domain types for the crop health client
//! (area-of-interest polygons, location candidates, analysis jobs) and the
//! port traits that adapters implement for the job API, geocoding, and the
//! map-drawing backend.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{CropwatchError, ErrorKind, Result};
