//! geolens-ar: location-triggered photo fetch-and-anchor pipeline
//!
//! Turns AR location estimates into geo-anchored photo annotations:
//! a cooldown gate limits searches, the Flickr client finds nearby geotagged
//! photos, and the placer downloads each image and anchors it in the scene.
//!
//! Exposes public APIs for the driver binary and integration testing.

pub mod error;
pub mod fetch_gate;
pub mod flickr_client;
pub mod image_fetcher;
pub mod photo;
pub mod pipeline;
pub mod placer;
pub mod scene;

pub use crate::error::{FetchError, FetchResult};
pub use crate::fetch_gate::{FetchGate, GateState};
pub use crate::flickr_client::{FlickrClient, PhotoSearch};
pub use crate::image_fetcher::{DecodedImage, HttpImageFetcher, ImageFetcher};
pub use crate::photo::PhotoRecord;
pub use crate::pipeline::{PipelineHandle, PipelineMessage, PipelineParts};
pub use crate::placer::AnnotationPlacer;
pub use crate::scene::{AnnotationLayer, LocationAnnotationNode, SceneGraph};
