//! Geographic value types shared between the AR adapter and the pipeline

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A real-world latitude/longitude pair in decimal degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    /// Create a location without range checks
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a location, rejecting non-finite or out-of-range coordinates
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidInput(format!(
                "latitude out of range: {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude out of range: {}",
                longitude
            )));
        }
        Ok(Self::new(latitude, longitude))
    }
}

/// Position in renderer (scene) space, metres relative to the session origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenePosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ScenePosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A refined estimate of where the device is, produced by the AR framework
///
/// Transient: read once by whoever handles the event, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationEstimate {
    /// Device position in renderer space
    pub position: ScenePosition,
    /// Device position in the world
    pub location: GeoLocation,
    /// Horizontal accuracy radius in metres, if the location source reports one
    pub horizontal_accuracy: Option<f64>,
    /// When the estimate was produced
    pub timestamp: DateTime<Utc>,
}

impl LocationEstimate {
    pub fn new(position: ScenePosition, location: GeoLocation) -> Self {
        Self {
            position,
            location,
            horizontal_accuracy: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_accuracy(mut self, metres: f64) -> Self {
        self.horizontal_accuracy = Some(metres);
        self
    }
}
