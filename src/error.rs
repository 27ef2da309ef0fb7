//! Error types for the voice router

use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing or serving a query
///
/// None of these ever reach the transcript producer: the router logs them and
/// the domain handlers turn them into spoken apologies.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Data provider error (rate or forecast source)
    #[error("provider error: {0}")]
    Provider(String),

    /// Speech synthesis sink error
    #[error("speech error: {0}")]
    Speech(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
