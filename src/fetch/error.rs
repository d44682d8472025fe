//! Classification of a single failed request attempt.

use std::time::Duration;
use thiserror::Error;

/// Why one attempt at an upstream request failed.
///
/// Only the retry loop in [`super::Transport`] sees these; callers of the
/// transport always get a document back.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP 429, with the server's `Retry-After` delay when it sent one.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    /// Connection failure or timeout.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}
