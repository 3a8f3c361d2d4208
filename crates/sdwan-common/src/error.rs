//! Error types for the SD-WAN engine

use thiserror::Error;

/// SD-WAN error type
#[derive(Error, Debug)]
pub enum SdwanError {
    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Metric source failed to produce a sample
    #[error("metric source error: {0}")]
    MetricSource(String),

    /// Local API error
    #[error("api error: {0}")]
    Api(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the SD-WAN engine
pub type SdwanResult<T> = Result<T, SdwanError>;
