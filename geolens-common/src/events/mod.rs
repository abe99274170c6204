//! Event types for the geolens event system
//!
//! Provides the shared event enum and the EventBus that carries both the
//! inbound location estimates from the AR framework and the pipeline's
//! outbound notifications.

use crate::geo::{GeoLocation, LocationEstimate};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// geolens event types
///
/// Events are broadcast via EventBus and are serializable so an adapter can
/// forward them elsewhere (debug overlay, log shipping).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeolensEvent {
    /// The AR subsystem refined its estimate of the device's position
    ///
    /// Published by the AR adapter. Triggers:
    /// - Pipeline: fetch gate check, photo search
    LocationEstimateUpdated { estimate: LocationEstimate },

    /// The fetch gate allowed a search and a request was issued
    PhotoSearchStarted {
        location: GeoLocation,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A search finished (an empty result also covers transport and decode failures)
    PhotoSearchCompleted {
        location: GeoLocation,
        photo_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An annotation was added to the scene
    AnnotationAdded {
        annotation_id: Uuid,
        photo_id: String,
        location: GeoLocation,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One photo's image could not be downloaded or decoded
    ImageDownloadFailed {
        photo_id: String,
        url: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The cooldown elapsed and the next estimate may trigger a search
    FetchReenabled {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl GeolensEvent {
    /// Short event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            GeolensEvent::LocationEstimateUpdated { .. } => "LocationEstimateUpdated",
            GeolensEvent::PhotoSearchStarted { .. } => "PhotoSearchStarted",
            GeolensEvent::PhotoSearchCompleted { .. } => "PhotoSearchCompleted",
            GeolensEvent::AnnotationAdded { .. } => "AnnotationAdded",
            GeolensEvent::ImageDownloadFailed { .. } => "ImageDownloadFailed",
            GeolensEvent::FetchReenabled { .. } => "FetchReenabled",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use geolens_common::events::{EventBus, GeolensEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(GeolensEvent::FetchReenabled {
///     timestamp: chrono::Utc::now(),
/// });
///
/// // In async context:
/// // while let Ok(event) = rx.recv().await { ... }
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GeolensEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<GeolensEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: GeolensEvent,
    ) -> Result<usize, broadcast::error::SendError<GeolensEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GeolensEvent) {
        let _ = self.tx.send(event);
    }

    /// Publish a location estimate on behalf of the AR framework
    pub fn publish_location_estimate(&self, estimate: LocationEstimate) {
        self.emit_lossy(GeolensEvent::LocationEstimateUpdated { estimate });
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
