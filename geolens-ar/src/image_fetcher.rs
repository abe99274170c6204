//! Image download and decode
//!
//! One plain GET per photo URL; the body is raw image bytes (JPEG from Flickr,
//! anything the `image` crate recognises is accepted).

use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use image::RgbaImage;
use reqwest::{header, Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Decoded bitmap, shared cheaply between the fetcher and the scene
pub type DecodedImage = Arc<RgbaImage>;

/// Retrieves and decodes the image behind a URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<DecodedImage>;
}

/// HTTP image fetcher backed by reqwest
pub struct HttpImageFetcher {
    http_client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("geolens-ar/", env!("CARGO_PKG_VERSION"))),
        );

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<DecodedImage> {
        let url = Url::parse(url)
            .map_err(|e| FetchError::MissingData(format!("Invalid image URL '{}': {}", url, e)))?;

        let response = self.http_client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        let size = bytes.len();

        // Decoding is CPU-bound, keep it off the async workers
        let image = tokio::task::spawn_blocking(move || decode_image(&bytes))
            .await
            .map_err(|e| FetchError::ImageDecode(format!("Decode task failed: {}", e)))??;

        debug!(
            width = image.width(),
            height = image.height(),
            bytes = size,
            "Image decoded"
        );
        Ok(image)
    }
}

/// Decode raw image bytes into an RGBA bitmap
pub fn decode_image(bytes: &[u8]) -> FetchResult<DecodedImage> {
    if bytes.is_empty() {
        return Err(FetchError::ImageDecode("empty image body".to_string()));
    }
    let image = image::load_from_memory(bytes)?;
    Ok(Arc::new(image.into_rgba8()))
}
