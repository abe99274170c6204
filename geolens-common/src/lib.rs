//! # geolens Common Library
//!
//! Shared code for the geolens crates:
//! - Error type
//! - Event types (GeolensEvent enum) and the EventBus
//! - Geographic value types (locations, scene positions, estimates)
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod geo;

pub use error::{Error, Result};
pub use geo::{GeoLocation, LocationEstimate, ScenePosition};
