//! Custom error types for the NAS manager.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NasError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        status: u16,
        endpoint: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl NasError {
    /// True when the failure came from talking to the remote system
    /// (transport, status code or response body) rather than local input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            NasError::Http(_) | NasError::Api { .. } | NasError::Serialization(_) | NasError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NasError>;
