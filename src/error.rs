// src/error.rs
// =============================================================================
// Error types for the crawler library.
//
// The traversal itself has almost no failure modes: an exhausted depth, an
// already-visited page, or a page with no links are all normal outcomes.
// What can fail is building the inputs: a page with a negative load time,
// or a config file that is missing or malformed.
// =============================================================================

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Errors raised while building crawl inputs.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// A page was constructed with a negative simulated load time
    #[error("invalid load time for '{url}': {load_time_ms}ms (must be >= 0)")]
    InvalidLoadCost { url: String, load_time_ms: i64 },

    /// Configuration could not be used
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration values failed a sanity check
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CrawlError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
