//! Flickr photo search client
//!
//! Queries `flickr.photos.search` for the most recent geotagged photos around
//! a coordinate and decodes the answer into [`PhotoRecord`]s.
//!
//! # API Reference
//! - Endpoint: https://api.flickr.com/services/rest/
//! - Documentation: https://www.flickr.com/services/api/flickr.photos.search.html
//!
//! # Failure handling
//! [`PhotoSearch::search`] never fails: transport errors, HTTP errors,
//! `stat: fail` payloads and undecodable bodies are logged and reported as an
//! empty result, indistinguishable from "no photos nearby".

use crate::error::{FetchError, FetchResult};
use crate::photo::{decode_search_response, PhotoRecord};
use async_trait::async_trait;
use geolens_common::config::FlickrConfig;
use reqwest::{header, Client, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Search method name
const SEARCH_METHOD: &str = "flickr.photos.search";

/// Newest uploads first
const SORT_ORDER: &str = "date-posted-desc";

/// Extra fields needed to anchor a photo: medium image URL and geo data
const EXTRAS: &str = "url_m,geo";

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("geolens-ar/", env!("CARGO_PKG_VERSION"));

/// Source of nearby photo records
///
/// Implemented by [`FlickrClient`]; tests substitute scripted sources.
#[async_trait]
pub trait PhotoSearch: Send + Sync {
    /// Photos near the given coordinate, newest first. Empty on any failure.
    async fn search(&self, latitude: f64, longitude: f64) -> Vec<PhotoRecord>;
}

/// Flickr REST client
pub struct FlickrClient {
    /// HTTP client for API requests
    http_client: Client,
    endpoint: Url,
    api_key: String,
    per_page: u32,
    accuracy: u8,
}

impl FlickrClient {
    /// Create a client from configuration
    pub fn new(config: &FlickrConfig, timeout: Duration) -> FetchResult<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            FetchError::Parse(format!("Invalid Flickr endpoint '{}': {}", config.endpoint, e))
        })?;

        if config.api_key.is_empty() {
            warn!("No Flickr API key configured, searches will be rejected by the API");
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key: config.api_key.clone(),
            per_page: config.per_page,
            accuracy: config.accuracy,
        })
    }

    /// Full search URL for a coordinate
    pub fn search_url(&self, latitude: f64, longitude: f64) -> Url {
        let per_page = self.per_page.to_string();
        let accuracy = self.accuracy.to_string();
        let lat = latitude.to_string();
        let lon = longitude.to_string();

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("method", SEARCH_METHOD)
            .append_pair("api_key", &self.api_key)
            .append_pair("format", "json")
            .append_pair("nojsoncallback", "1")
            .append_pair("accuracy", &accuracy)
            .append_pair("sort", SORT_ORDER)
            .append_pair("per_page", &per_page)
            .append_pair("extras", EXTRAS)
            .append_pair("lat", &lat)
            .append_pair("lon", &lon);
        url
    }

    /// Search, surfacing the failure cause
    pub async fn try_search(&self, latitude: f64, longitude: f64) -> FetchResult<Vec<PhotoRecord>> {
        let url = self.search_url(latitude, longitude);
        debug!(lat = latitude, lon = longitude, "Querying Flickr photo search");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Flickr request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read Flickr response: {}", e)))?;

        decode_search_response(&body)
    }
}

#[async_trait]
impl PhotoSearch for FlickrClient {
    async fn search(&self, latitude: f64, longitude: f64) -> Vec<PhotoRecord> {
        match self.try_search(latitude, longitude).await {
            Ok(records) => {
                info!(
                    lat = latitude,
                    lon = longitude,
                    count = records.len(),
                    "Flickr search complete"
                );
                records
            }
            Err(e) => {
                warn!(lat = latitude, lon = longitude, error = %e, "Flickr search failed");
                Vec::new()
            }
        }
    }
}
