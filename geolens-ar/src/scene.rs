//! Scene-graph seam
//!
//! The AR framework owns rendering; the pipeline only hands it finished
//! location-anchored nodes. Nodes are never removed or limited, so a long
//! session accumulates every annotation it has placed.

use crate::image_fetcher::DecodedImage;
use geolens_common::GeoLocation;
use tracing::info;
use uuid::Uuid;

/// A displayable image fixed to a geographic anchor
///
/// Immutable once handed to a scene.
#[derive(Debug, Clone)]
pub struct LocationAnnotationNode {
    id: Uuid,
    photo_id: String,
    location: GeoLocation,
    image: DecodedImage,
    scale_relative_to_distance: bool,
}

impl LocationAnnotationNode {
    /// New node; scales with distance until told otherwise
    pub fn new(photo_id: impl Into<String>, location: GeoLocation, image: DecodedImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            photo_id: photo_id.into(),
            location,
            image,
            scale_relative_to_distance: true,
        }
    }

    pub fn with_scale_relative_to_distance(mut self, enabled: bool) -> Self {
        self.scale_relative_to_distance = enabled;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn photo_id(&self) -> &str {
        &self.photo_id
    }

    pub fn location(&self) -> GeoLocation {
        self.location
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    pub fn scale_relative_to_distance(&self) -> bool {
        self.scale_relative_to_distance
    }
}

/// Scene collaborator that accepts location-anchored nodes
///
/// Only ever called from the pipeline actor's task.
pub trait SceneGraph: Send + 'static {
    fn add_location_node_with_confirmed_location(&mut self, node: LocationAnnotationNode);

    /// Number of location nodes currently in the scene
    fn location_node_count(&self) -> usize;
}

/// In-memory scene that records and logs every node it receives
///
/// Used by the headless driver and as the test double for the AR framework.
#[derive(Debug, Default)]
pub struct AnnotationLayer {
    nodes: Vec<LocationAnnotationNode>,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[LocationAnnotationNode] {
        &self.nodes
    }
}

impl SceneGraph for AnnotationLayer {
    fn add_location_node_with_confirmed_location(&mut self, node: LocationAnnotationNode) {
        info!(
            node_id = %node.id(),
            photo_id = %node.photo_id(),
            lat = node.location().latitude,
            lon = node.location().longitude,
            width = node.image().width(),
            height = node.image().height(),
            total = self.nodes.len() + 1,
            "Added annotation"
        );
        self.nodes.push(node);
    }

    fn location_node_count(&self) -> usize {
        self.nodes.len()
    }
}
