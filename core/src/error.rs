//! Error types for the API v1 client core.
//!
//! # Design
//! HTTP outcomes are never errors here: a 4xx/5xx response is a classified
//! `ApiV1Response::Error`, a dropped connection is a `RequestResponse` without
//! a response. `ApiError` only covers faults that happen before a request can
//! be dispatched at all, such as a payload that does not serialize or a
//! misconfigured client. Those are programmer or setup mistakes and callers
//! are expected to fail fast on them.

use thiserror::Error;

/// Setup and request-building faults.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration value was missing or malformed.
    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// The HTTP client backing a transport could not be constructed.
    #[error("transport setup failed: {0}")]
    TransportSetup(#[from] reqwest::Error),
}

impl ApiError {
    pub(crate) fn invalid_config(key: &str, reason: impl Into<String>) -> Self {
        ApiError::InvalidConfig {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
