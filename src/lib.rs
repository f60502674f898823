//! insights - Routes meeting, chat and whiteboard artifacts to LLM backends
//!
//! Requests are normalized by the router, translated into backend wire
//! payloads by an adapter, and dispatched with a rotating pool of API keys.

pub mod cli;
pub mod client;
pub mod config;
pub mod credentials;
pub mod executor;
pub mod instance;
pub mod llm;
pub mod request;
pub mod response;

use thiserror::Error;

/// Main error type for insights
#[derive(Error, Debug)]
pub enum InsightsError {
    /// Every key of the pool was rate limited during one call
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Malformed backend response: {reason}; raw reply: {raw}")]
    MalformedBackendResponse { reason: String, raw: String },

    #[error("Unsupported request type: {0}")]
    UnsupportedRequestType(String),

    #[error("AI service initialization failed: {0}")]
    InitializationFailure(String),

    #[error("AI executor rejected the request: {0}")]
    ExecutorRejected(String),

    #[error("{backend} returned HTTP {status}: {body}")]
    Backend {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("All configured LLM services failed to process the request")]
    AllServicesFailed,

    #[error("Model output not in the expected format: {0}")]
    InvalidModelOutput(String),

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InsightsError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "insights";
