//! Client configuration.
//!
//! Values come from defaults or from the environment. The base URL is parsed
//! and normalized once here, so a malformed URL is rejected at setup time and
//! endpoint paths can always be appended with a leading `/`.

use std::time::Duration;

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:9000/api/v1";
pub const DEFAULT_TOAST_AUTO_HIDE: Duration = Duration::from_millis(5000);

const BASE_URL_KEY: &str = "base_url";
const ENV_BASE_URL: &str = "API_V1_BASE_URL";
const ENV_REQUEST_TIMEOUT_MS: &str = "API_V1_REQUEST_TIMEOUT_MS";
const ENV_TOAST_AUTO_HIDE_MS: &str = "API_V1_TOAST_AUTO_HIDE_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    /// Transport-level timeout. `None` leaves calls unbounded.
    pub request_timeout: Option<Duration>,
    /// How long error toasts raised by the toaster middleware stay visible.
    pub toast_auto_hide: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            toast_auto_hide: DEFAULT_TOAST_AUTO_HIDE,
        }
    }
}

impl ClientConfig {
    /// Fails with `ApiError::InvalidConfig` unless `base_url` is an absolute
    /// http(s) URL with a host.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Prefix for every endpoint path, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to
    /// defaults for absent keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = match lookup(ENV_BASE_URL) {
            Some(base_url) => Self::new(&base_url)?,
            None => Self::default(),
        };
        if let Some(ms) = parse_millis(&lookup, ENV_REQUEST_TIMEOUT_MS)? {
            config.request_timeout = Some(ms);
        }
        if let Some(ms) = parse_millis(&lookup, ENV_TOAST_AUTO_HIDE_MS)? {
            config.toast_auto_hide = ms;
        }
        Ok(config)
    }
}

fn parse_base_url(raw: &str) -> Result<String, ApiError> {
    let invalid = |reason: String| ApiError::invalid_config(BASE_URL_KEY, format!("{raw:?}: {reason}"));
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, ApiError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| ApiError::invalid_config(key, e.to_string())),
    }
}
