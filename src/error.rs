//! Error types for aixpand-gateway.

use thiserror::Error;

/// Main error type for all gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// I/O error while reading options files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while decoding event arguments.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Options file could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Options parsed but are not usable.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The async options factory failed.
    #[error("Options factory failed: {0}")]
    OptionsFactory(String),

    /// The network client reported a failure.
    #[error("Client error: {0}")]
    Client(String),

    /// Stream handlers need a tokio runtime to deliver messages.
    #[error("No tokio runtime available for stream delivery")]
    NoRuntime,
}

/// Result type alias using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;
