//! Fetch-level error types.

use thiserror::Error;

/// Errors from a single upstream fetch. The stream engine decides whether to
/// retry; no retry happens at this level.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}
