/*!
 * Outbound HTTP with retry.
 *
 * Every request to the content store and to the translation backends goes through
 * `RetryingHttpClient`. Rate-limit responses (429) and transient failures (connection
 * errors, timeouts, 5xx) are retried with exponential backoff, honoring a `Retry-After`
 * hint when the server sends one. Authentication failures are never retried.
 */

use log::{debug, warn};
use rand::Rng;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::errors::ProviderError;

/// Retry limits for outbound calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff, doubled on each retry
    pub backoff_base_ms: u64,
    /// Upper bound for a computed backoff. A server `Retry-After` hint is waited in full.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
            max_backoff_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), without jitter
    pub fn backoff(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        match retry_after_secs {
            Some(secs) => Duration::from_secs(secs),
            None => {
                let ms = self.backoff_base_ms.saturating_mul(1u64 << attempt.min(20));
                Duration::from_millis(ms.min(self.max_backoff_ms))
            }
        }
    }
}

/// Parse a `Retry-After` header value given in seconds or as an HTTP date
pub fn parse_retry_after(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }
    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delta = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(delta.num_seconds().max(0) as u64)
}

/// HTTP client wrapper applying the retry policy
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingHttpClient {
    /// Create a client with the given request timeout and retry policy
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            policy,
        }
    }

    /// Send a request, retrying rate-limited and transient failures.
    ///
    /// `build` is invoked once per attempt so the request body can be rebuilt.
    pub async fn send<F>(&self, build: F) -> Result<Response, ProviderError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = match build(&self.client).send().await {
                Ok(response) => Self::check_status(response).await,
                Err(e) if e.is_timeout() || e.is_connect() => Err(ProviderError::ConnectionError(e.to_string())),
                Err(e) => Err(ProviderError::RequestFailed(e.to_string())),
            };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !error.is_retryable() || attempt >= self.policy.max_retries {
                if error.is_retryable() {
                    warn!("Giving up after {} attempts: {}", attempt + 1, error);
                }
                return Err(error);
            }

            let retry_after = match &error {
                ProviderError::RateLimitExceeded { retry_after_secs, .. } => *retry_after_secs,
                _ => None,
            };
            let delay = self.policy.backoff(attempt, retry_after) + self.jitter();
            debug!("Request failed ({}), retrying in {:?} (attempt {}/{})",
                   error, delay, attempt + 1, self.policy.max_retries);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Send a request and decode a JSON body
    pub async fn send_json<T, F>(&self, build: F) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = self.send(build).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            ProviderError::ParseError(format!("{} (body: {})", e, preview))
        })
    }

    fn jitter(&self) -> Duration {
        let spread = self.policy.backoff_base_ms / 4;
        if spread == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=spread))
    }

    async fn check_status(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded {
                message,
                retry_after_secs: retry_after,
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
            StatusCode::NOT_FOUND => ProviderError::NotFound(message),
            _ => ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            },
        })
    }
}
