//! Fetch-and-anchor pipeline
//!
//! A single actor task owns the [`FetchGate`] and the scene. It listens on the
//! [`EventBus`] for location estimates and on its mailbox for results coming
//! back from network tasks:
//!
//! ```text
//! LocationEstimateUpdated -> gate -> search task -> SearchCompleted
//!                                   -> placer downloads -> ImageReady -> scene
//! ```
//!
//! Network work never touches the gate or the scene directly; everything is
//! marshaled back through the mailbox.

use crate::error::FetchResult;
use crate::fetch_gate::FetchGate;
use crate::flickr_client::{FlickrClient, PhotoSearch};
use crate::image_fetcher::{DecodedImage, HttpImageFetcher, ImageFetcher};
use crate::photo::PhotoRecord;
use crate::placer::AnnotationPlacer;
use crate::scene::SceneGraph;
use geolens_common::config::TomlConfig;
use geolens_common::events::{EventBus, GeolensEvent};
use geolens_common::{GeoLocation, LocationEstimate, ScenePosition};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};

/// Pending results per pipeline before network tasks wait for the actor
const MAILBOX_CAPACITY: usize = 64;

/// Messages delivered to the pipeline actor
#[derive(Debug)]
pub enum PipelineMessage {
    /// A photo search finished (empty on failure)
    SearchCompleted {
        location: GeoLocation,
        records: Vec<PhotoRecord>,
    },
    /// One photo's image is downloaded and decoded
    ImageReady {
        record: PhotoRecord,
        location: GeoLocation,
        image: DecodedImage,
    },
    /// Stop the actor and give the scene back
    Shutdown,
}

/// Pipeline collaborators and settings
pub struct PipelineParts<S> {
    pub scene: S,
    pub search: Arc<dyn PhotoSearch>,
    pub fetcher: Arc<dyn ImageFetcher>,
    pub cooldown: Duration,
}

impl<S: SceneGraph> PipelineParts<S> {
    /// Production collaborators (Flickr search, HTTP image fetcher) from config
    pub fn from_config(config: &TomlConfig, scene: S) -> FetchResult<Self> {
        let timeout = config.fetch.request_timeout();
        Ok(Self {
            scene,
            search: Arc::new(FlickrClient::new(&config.flickr, timeout)?),
            fetcher: Arc::new(HttpImageFetcher::new(timeout)?),
            cooldown: config.fetch.cooldown(),
        })
    }
}

/// Handle to a running pipeline
pub struct PipelineHandle<S> {
    event_bus: EventBus,
    mailbox: mpsc::Sender<PipelineMessage>,
    task: JoinHandle<S>,
}

impl<S: SceneGraph> PipelineHandle<S> {
    /// Start the pipeline actor
    ///
    /// The actor subscribes to `event_bus` before this returns, so estimates
    /// published right afterwards are not missed.
    pub fn spawn(event_bus: EventBus, parts: PipelineParts<S>) -> Self {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let events = event_bus.subscribe();

        let actor = PipelineActor {
            gate: FetchGate::new(parts.cooldown),
            scene: parts.scene,
            search: parts.search,
            placer: AnnotationPlacer::new(parts.fetcher, tx.clone(), event_bus.clone()),
            event_bus: event_bus.clone(),
            events,
            mailbox_tx: tx.clone(),
            mailbox_rx: rx,
        };

        info!(cooldown_secs = parts.cooldown.as_secs_f64(), "Photo pipeline started");

        Self {
            event_bus,
            mailbox: tx,
            task: tokio::spawn(actor.run()),
        }
    }

    /// Deliver a location estimate, as the AR framework's delegate callback would
    pub fn location_estimate_updated(&self, position: ScenePosition, location: GeoLocation) {
        self.event_bus
            .publish_location_estimate(LocationEstimate::new(position, location));
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Stop the actor and return the scene with every annotation placed so far
    ///
    /// Downloads still in flight are abandoned.
    pub async fn shutdown(self) -> Result<S, JoinError> {
        if self.mailbox.send(PipelineMessage::Shutdown).await.is_err() {
            debug!("Pipeline actor already stopped");
        }
        self.task.await
    }
}

struct PipelineActor<S> {
    gate: FetchGate,
    scene: S,
    search: Arc<dyn PhotoSearch>,
    placer: AnnotationPlacer,
    event_bus: EventBus,
    events: broadcast::Receiver<GeolensEvent>,
    mailbox_tx: mpsc::Sender<PipelineMessage>,
    mailbox_rx: mpsc::Receiver<PipelineMessage>,
}

impl<S: SceneGraph> PipelineActor<S> {
    async fn run(mut self) -> S {
        loop {
            let reopen = self.gate.reopens_at();

            tokio::select! {
                message = self.mailbox_rx.recv() => match message {
                    Some(PipelineMessage::Shutdown) | None => break,
                    Some(message) => self.handle_message(message),
                },
                event = self.events.recv() => match event {
                    Ok(GeolensEvent::LocationEstimateUpdated { estimate }) => {
                        self.on_location_estimate(estimate);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Pipeline lagged behind the event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = sleep_until(reopen.unwrap_or_else(Instant::now)), if reopen.is_some() => {
                    if self.gate.expire_at(Instant::now()) {
                        info!("Photo fetch re-enabled");
                        self.event_bus.emit_lossy(GeolensEvent::FetchReenabled {
                            timestamp: chrono::Utc::now(),
                        });
                    }
                }
            }
        }

        info!(
            annotations = self.scene.location_node_count(),
            "Photo pipeline stopped"
        );
        self.scene
    }

    fn on_location_estimate(&mut self, estimate: LocationEstimate) {
        if !self.gate.try_acquire() {
            trace!("Fetch gate closed, ignoring location estimate");
            return;
        }

        let location = estimate.location;
        info!(
            lat = location.latitude,
            lon = location.longitude,
            accuracy_m = ?estimate.horizontal_accuracy,
            "Attempting Flickr API call"
        );
        self.event_bus.emit_lossy(GeolensEvent::PhotoSearchStarted {
            location,
            timestamp: chrono::Utc::now(),
        });

        let search = Arc::clone(&self.search);
        let mailbox = self.mailbox_tx.clone();
        tokio::spawn(async move {
            let records = search.search(location.latitude, location.longitude).await;
            let message = PipelineMessage::SearchCompleted { location, records };
            if mailbox.send(message).await.is_err() {
                debug!("Pipeline stopped before search results arrived");
            }
        });
    }

    fn handle_message(&mut self, message: PipelineMessage) {
        match message {
            PipelineMessage::SearchCompleted { location, records } => {
                self.event_bus.emit_lossy(GeolensEvent::PhotoSearchCompleted {
                    location,
                    photo_count: records.len(),
                    timestamp: chrono::Utc::now(),
                });
                self.placer.place(records);
            }
            PipelineMessage::ImageReady {
                record,
                location,
                image,
            } => {
                let annotation_id =
                    AnnotationPlacer::anchor(&mut self.scene, &record, location, image);
                self.event_bus.emit_lossy(GeolensEvent::AnnotationAdded {
                    annotation_id,
                    photo_id: record.id,
                    location,
                    timestamp: chrono::Utc::now(),
                });
            }
            PipelineMessage::Shutdown => {}
        }
    }
}
