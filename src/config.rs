//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::net::error::ApiError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_FILE: &str = "carpool-session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash, e.g. `http://localhost:8080/api`.
    pub api_url: String,
    pub timeouts: Timeouts,
    /// Where the signed-in session is persisted between runs.
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            timeouts: Timeouts::default(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CARPOOL_API_URL`: default `http://localhost:8080/api`
    /// - `CARPOOL_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CARPOOL_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CARPOOL_SESSION_FILE`: default `carpool-session.json`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if `CARPOOL_API_URL` is not an
    /// absolute http(s) URL.
    pub fn from_env() -> Result<Self, ApiError> {
        let api_url = normalize_api_url(&std::env::var("CARPOOL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()))?;
        let timeouts = Timeouts {
            request_secs: env_parse_u64("CARPOOL_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("CARPOOL_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let session_file = std::env::var("CARPOOL_SESSION_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        Ok(Self { api_url, timeouts, session_file })
    }

    /// Replace the API URL, validating it the same way [`ClientConfig::from_env`] does.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] for relative or non-http(s) URLs.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ApiError> {
        self.api_url = normalize_api_url(raw)?;
        Ok(self)
    }
}

/// Validate a base URL and strip trailing slashes so endpoints can be appended verbatim.
pub(crate) fn normalize_api_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| ApiError::InvalidBaseUrl(format!("{trimmed}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidBaseUrl(format!("{trimmed}: unsupported scheme {}", parsed.scheme())));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
