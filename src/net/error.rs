//! Errors produced by the API client layer.

/// Errors produced by API client construction and envelope unwrapping.
///
/// Transport and HTTP failures never surface as `Err` from the client
/// itself; they are folded into a failed [`super::envelope::ApiResponse`]
/// and only become an `ApiError` when a caller asks for a `Result`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The configured base URL is not an absolute http(s) URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The backend (or transport) reported failure; carries the user-facing message.
    #[error("{0}")]
    Rejected(String),

    /// The call succeeded but the payload the caller needed was absent.
    #[error("response carried no data")]
    MissingData,
}

impl ApiError {
    /// Message suitable for an inline error banner, falling back when the
    /// backend supplied nothing useful.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected(message) if !message.trim().is_empty() => message.clone(),
            Self::Rejected(_) | Self::MissingData => fallback.to_owned(),
            other => other.to_string(),
        }
    }
}
