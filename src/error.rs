// Error types for the offline cache agent.
// Covers network, cache store, configuration, and host adapter failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unexpected HTTP {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Install failed while caching {url}: {reason}")]
    Install { url: String, reason: String },

    #[error("Offline and no cached fallback for {0}")]
    NoFallback(String),

    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
