//! Annotation placer
//!
//! Starts one independent download per usable photo record. Each completion
//! is posted to the pipeline mailbox; the pipeline actor then calls
//! [`AnnotationPlacer::anchor`] on its own task, so the scene is only ever
//! touched by its owner. A failed download drops that one record.

use crate::image_fetcher::{DecodedImage, ImageFetcher};
use crate::photo::PhotoRecord;
use crate::pipeline::PipelineMessage;
use crate::scene::{LocationAnnotationNode, SceneGraph};
use geolens_common::events::{EventBus, GeolensEvent};
use geolens_common::GeoLocation;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct AnnotationPlacer {
    fetcher: Arc<dyn ImageFetcher>,
    mailbox: mpsc::Sender<PipelineMessage>,
    event_bus: EventBus,
}

impl AnnotationPlacer {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        mailbox: mpsc::Sender<PipelineMessage>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            fetcher,
            mailbox,
            event_bus,
        }
    }

    /// Start downloads for every record that has a URL and coordinates
    ///
    /// Returns the number of downloads started. Completion order is
    /// unspecified.
    pub fn place(&self, records: Vec<PhotoRecord>) -> usize {
        info!(count = records.len(), "Attempting photos download");

        let mut started = 0;
        for record in records {
            let (url, location) = match record.anchor_parts() {
                Ok((url, location)) => (url.to_string(), location),
                Err(e) => {
                    debug!(photo_id = %record.id, error = %e, "Skipping photo");
                    continue;
                }
            };

            let fetcher = Arc::clone(&self.fetcher);
            let mailbox = self.mailbox.clone();
            let event_bus = self.event_bus.clone();

            tokio::spawn(async move {
                match fetcher.fetch(&url).await {
                    Ok(image) => {
                        let message = PipelineMessage::ImageReady {
                            record,
                            location,
                            image,
                        };
                        if mailbox.send(message).await.is_err() {
                            debug!(url = %url, "Pipeline stopped before image could be placed");
                        }
                    }
                    Err(e) => {
                        warn!(photo_id = %record.id, url = %url, error = %e, "Image download unsuccessful");
                        event_bus.emit_lossy(GeolensEvent::ImageDownloadFailed {
                            photo_id: record.id,
                            url,
                            reason: e.to_string(),
                            timestamp: chrono::Utc::now(),
                        });
                    }
                }
            });
            started += 1;
        }

        started
    }

    /// Build the annotation for a downloaded image and hand it to the scene
    pub fn anchor<S: SceneGraph>(
        scene: &mut S,
        record: &PhotoRecord,
        location: GeoLocation,
        image: DecodedImage,
    ) -> Uuid {
        let node = LocationAnnotationNode::new(record.id.clone(), location, image)
            .with_scale_relative_to_distance(false);
        let id = node.id();
        scene.add_location_node_with_confirmed_location(node);
        id
    }
}
