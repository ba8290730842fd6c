//! Error types for Campus Scout
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Campus Scout operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, portal authentication, content extraction,
/// run persistence, and the chat endpoint.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing portal credentials (checked before any network action)
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Two-factor approval did not arrive within the configured ceiling
    #[error("Authentication timed out after {waited_seconds}s waiting for two-factor approval")]
    AuthenticationTimeout {
        /// Seconds spent waiting before giving up
        waited_seconds: u64,
    },

    /// A login-page selector was not found; the identity provider's UI
    /// has drifted and the automation needs an update, not a retry
    #[error("Authentication UI mismatch: selector not found: {0}")]
    AuthenticationUiMismatch(String),

    /// Browser automation errors (navigation, element lookup, screenshots)
    #[error("Browser error: {0}")]
    Browser(String),

    /// Per-target extraction errors (recorded inline, never fatal for a run)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Run persistence errors (write/list/load of run documents)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Corridor map errors (parse, validation)
    #[error("Map error: {0}")]
    Map(String),

    /// Chat provider errors (API calls, authentication, response shape)
    #[error("Provider error: {0}")]
    Provider(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Campus Scout operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
