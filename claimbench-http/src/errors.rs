//! HTTP error types

/// Error type for HTTP setup.
///
/// Only construction can fail; individual submissions and queries report
/// through `SubmitOutcome` and `OracleError`.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl HttpError {
    pub(crate) fn invalid_url(url: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}
