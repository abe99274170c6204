//! Common error types for geolens

use thiserror::Error;

/// Common result type for geolens operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across geolens crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML file could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input value (e.g. coordinates out of range)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
