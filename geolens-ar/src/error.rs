//! Error types for geolens-ar
//!
//! Every variant is handled as log-and-skip at the component boundary: the
//! search client turns errors into an empty result, the placer drops the one
//! record that failed. Nothing here reaches the user interface.

use thiserror::Error;

/// Failure while fetching or decoding remote data
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (DNS, connect, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-success HTTP status
    #[error("HTTP status {status} from {url}")]
    Http { status: u16, url: String },

    /// Photo API reported a failure in its payload
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Payload was not the expected JSON shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Record lacks a field required to proceed
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Image bytes could not be decoded
    #[error("Image decode error: {0}")]
    ImageDecode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return FetchError::Http {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if err.is_decode() {
            return FetchError::Parse(err.to_string());
        }
        FetchError::Network(err.to_string())
    }
}

impl From<image::ImageError> for FetchError {
    fn from(err: image::ImageError) -> Self {
        FetchError::ImageDecode(err.to_string())
    }
}

/// Result alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;
