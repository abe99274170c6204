//! Test helpers: a local fake of the Flickr REST endpoint and image host
//!
//! Serves `GET /services/rest/` with a canned body and status, recording the
//! query string of every request, and `GET /img/:name` with:
//! - `missing*` -> 404
//! - `garbage*` -> 200 with a body that is not an image
//! - anything else -> a small PNG

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use geolens_common::events::GeolensEvent;
use image::{ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

struct FakeState {
    search_status: StatusCode,
    search_body: String,
    requests: Mutex<Vec<HashMap<String, String>>>,
}

/// Running fake server
pub struct FakeFlickr {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeFlickr {
    /// Start serving on an ephemeral localhost port
    pub async fn start(search_status: u16, search_body: impl Into<String>) -> Self {
        let state = Arc::new(FakeState {
            search_status: StatusCode::from_u16(search_status).unwrap(),
            search_body: search_body.into(),
            requests: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/services/rest/", get(search))
            .route("/img/:name", get(image))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/services/rest/", self.base_url)
    }

    pub fn image_url(&self, name: &str) -> String {
        format!("{}/img/{}", self.base_url, name)
    }

    /// Query parameters of every search request received so far
    pub fn search_requests(&self) -> Vec<HashMap<String, String>> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn search(
    State(state): State<Arc<FakeState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(params);
    (state.search_status, state.search_body.clone())
}

async fn image(Path(name): Path<String>) -> Response {
    if name.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    if name.starts_with("garbage") {
        return (StatusCode::OK, "definitely not a jpeg").into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        png_bytes(6, 4),
    )
        .into_response()
}

/// Encode a solid-colour PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// An address nothing is listening on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/services/rest/", addr)
}

/// Build a Flickr-shaped search response from photo entries
pub fn search_body(entries: Vec<serde_json::Value>) -> String {
    serde_json::json!({
        "photos": {
            "page": 1,
            "pages": 1,
            "perpage": 10,
            "total": entries.len(),
            "photo": entries,
        },
        "stat": "ok"
    })
    .to_string()
}

/// Wait (bounded) for the next event matching `pred`
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<GeolensEvent>, mut pred: F) -> GeolensEvent
where
    F: FnMut(&GeolensEvent) -> bool,
{
    let fut = async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("timed out waiting for event")
}

/// Collect annotation outcomes until `expected` images have either been
/// placed or have failed. Returns (added, failed).
pub async fn wait_for_batch(
    rx: &mut broadcast::Receiver<GeolensEvent>,
    expected: usize,
) -> (usize, usize) {
    let mut added = 0;
    let mut failed = 0;
    while added + failed < expected {
        match wait_for(rx, |e| {
            matches!(
                e,
                GeolensEvent::AnnotationAdded { .. } | GeolensEvent::ImageDownloadFailed { .. }
            )
        })
        .await
        {
            GeolensEvent::AnnotationAdded { .. } => added += 1,
            _ => failed += 1,
        }
    }
    (added, failed)
}
