//! This module provides functionality to create a retryable HTTP client with
//! middleware for handling transient errors, such as network issues or rate
//! limiting. One client is shared by the heartbeat and Telegram senders.

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

/// Retry and timeout policy for outbound calls.
///
/// Delivery failures are logged, not queued: the middleware's transient
/// retries are the only retry the watchdog performs, and the next cycle's
/// outcome decides whether to alert again.
#[derive(Debug, Clone)]
pub struct HttpRetryConfig {
    /// Maximum number of retries for transient errors.
    pub max_retries: u32,
    /// Initial backoff duration before the first retry.
    pub initial_backoff: Duration,
    /// Maximum backoff duration for retries.
    pub max_backoff: Duration,
    /// Bounded per-request timeout.
    pub request_timeout: Duration,
}

impl Default for HttpRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Creates a retryable HTTP client with middleware.
///
/// # Parameters:
/// - `config`: Configuration for retry and timeout policies
///
/// # Returns
/// A `ClientWithMiddleware` that includes retry capabilities
pub fn create_retryable_http_client(
    config: &HttpRetryConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let base_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(config.initial_backoff, config.max_backoff)
        .build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(base_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
