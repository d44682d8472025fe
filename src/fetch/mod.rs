//! Upstream transport: authenticated GET requests with bounded retry.

mod basic;
mod client;
mod error;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use error::FetchError;

use crate::parser::{Document, parse_document};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, Request, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Public MBTA v3 API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api-v3.mbta.com";

/// Longest `Retry-After` honoured; larger values are clamped to this.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Retry budget for one logical request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts for failures other than rate limiting.
    pub max_attempts: u32,
    /// Pause between those attempts.
    pub backoff: Duration,
    /// Wait used on a 429 without a usable `Retry-After`.
    pub rate_limit_delay: Duration,
    /// 429 waits tolerated within one request before giving up.
    pub max_rate_limit_waits: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            rate_limit_delay: Duration::from_secs(2),
            max_rate_limit_waits: 5,
        }
    }
}

impl RetryPolicy {
    /// Same budgets with every wait set to zero.
    pub fn immediate() -> Self {
        Self {
            backoff: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Shared handle to the upstream API.
///
/// Built once at startup and passed around behind an `Arc`. Every call
/// returns a [`Document`]: once retries are exhausted the empty document
/// stands in for the answer.
pub struct Transport {
    client: Arc<dyn HttpClient>,
    base_url: String,
    policy: RetryPolicy,
}

impl Transport {
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// GETs `path` with `query` and returns the parsed document.
    #[tracing::instrument(skip(self, query))]
    pub async fn request(&self, path: &str, query: &[(&str, String)]) -> Document {
        let url = match self.url(path, query) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Could not build request URL");
                return Document::empty();
            }
        };

        let mut attempts = 0;
        let mut rate_limit_waits = 0;

        loop {
            match self.attempt(&url).await {
                Ok(doc) => return doc,
                Err(FetchError::RateLimited { retry_after }) => {
                    rate_limit_waits += 1;
                    if rate_limit_waits > self.policy.max_rate_limit_waits {
                        error!(waits = rate_limit_waits - 1, "Still rate limited, giving up");
                        return Document::empty();
                    }
                    let delay = retry_after.unwrap_or(self.policy.rate_limit_delay);
                    warn!(delay_ms = delay.as_millis() as u64, "Rate limited, waiting");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.policy.max_attempts {
                        error!(error = %e, attempts, "Request failed after max retries");
                        return Document::empty();
                    }
                    warn!(error = %e, attempt = attempts, "Request failed, retrying");
                    tokio::time::sleep(self.policy.backoff).await;
                }
            }
        }
    }

    async fn attempt(&self, url: &Url) -> Result<Document, FetchError> {
        let req = Request::new(Method::GET, url.clone());
        let resp = self.client.execute(req).await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                retry_after: retry_after(resp.headers()),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "Response received");
        Ok(parse_document(&bytes)?)
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

/// Reads a `Retry-After` header given in (possibly fractional) seconds,
/// clamped to [`MAX_RETRY_AFTER`].
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs: f64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    if secs.is_nan() || secs < 0.0 {
        return None;
    }
    let delay = Duration::try_from_secs_f64(secs).unwrap_or(MAX_RETRY_AFTER);
    Some(delay.min(MAX_RETRY_AFTER))
}
