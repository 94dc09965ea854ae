//! Shared HTTP plumbing for remote lookup providers
//!
//! Every remote provider sends its requests through one [`HttpFetcher`]:
//! requests are throttled by a governor limiter, responses are classified
//! into permanent or transient failures, and transient failures are retried
//! with exponential backoff up to `max_retries` times.

use crate::config::LookupConfig;
use crate::errors::{AppError, Result};
use backoff::{future::retry, ExponentialBackoff};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{StatusCode, Url};
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::warn;

pub(crate) type Attempt<T> = std::result::Result<T, backoff::Error<AppError>>;

/// Rate-limited HTTP client shared by the remote providers
pub(crate) struct HttpFetcher {
    client: reqwest::Client,
    limiter: DefaultDirectRateLimiter,
    requests_per_second: u32,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("citesurf/{}", crate::VERSION))
            .build()?;

        let rps = NonZeroU32::new(config.requests_per_second).ok_or_else(|| AppError::Configuration {
            message: "lookup.requests_per_second must be at least 1".to_string(),
        })?;

        Ok(Self {
            client,
            limiter: RateLimiter::direct(Quota::per_second(rps)),
            requests_per_second: rps.get(),
            max_retries: config.max_retries,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// One throttled GET returning the response body
    pub async fn get_text(&self, identifier: &str, url: Url) -> Attempt<String> {
        self.limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| backoff::Error::transient(AppError::HttpClient(e)))?;

        classify_status(identifier, response.status(), self.requests_per_second)?;

        response
            .text()
            .await
            .map_err(|e| backoff::Error::transient(AppError::HttpClient(e)))
    }
}

/// Sort a non-success status into a permanent or transient failure
pub(crate) fn classify_status(identifier: &str, status: StatusCode, limit: u32) -> Attempt<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::NOT_FOUND => backoff::Error::permanent(AppError::LookupNotFound {
            identifier: identifier.to_string(),
        }),
        StatusCode::TOO_MANY_REQUESTS => backoff::Error::transient(AppError::RateLimited { limit }),
        s if s.is_server_error() => {
            backoff::Error::transient(AppError::lookup(identifier, format!("API error {}", s)))
        }
        s => backoff::Error::permanent(AppError::lookup(identifier, format!("API error {}", s))),
    })
}

/// Backoff schedule used by the remote providers
pub(crate) fn default_policy() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(200),
        max_elapsed_time: Some(Duration::from_secs(60)),
        ..Default::default()
    }
}

/// Run `operation`, retrying transient failures at most `max_retries` times
pub(crate) async fn with_retries<T, F, Fut>(
    provider: &str,
    identifier: &str,
    max_retries: u32,
    policy: ExponentialBackoff,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut attempt = 0u32;
    retry(policy, || {
        let current = attempt;
        attempt += 1;
        let request = operation();
        async move {
            match request.await {
                Err(backoff::Error::Transient { err, .. }) if current >= max_retries => {
                    Err(backoff::Error::permanent(err))
                }
                Err(backoff::Error::Transient { err, retry_after }) => {
                    warn!(
                        provider,
                        attempt = current + 1,
                        max_retries,
                        identifier,
                        error = %err,
                        "Lookup request failed, retrying"
                    );
                    Err(backoff::Error::Transient { err, retry_after })
                }
                other => other,
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status("10.1/a", StatusCode::OK, 5).is_ok());

        match classify_status("10.1/a", StatusCode::NOT_FOUND, 5) {
            Err(backoff::Error::Permanent(AppError::LookupNotFound { identifier })) => {
                assert_eq!(identifier, "10.1/a")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            classify_status("10.1/a", StatusCode::TOO_MANY_REQUESTS, 5),
            Err(backoff::Error::Transient { err: AppError::RateLimited { limit: 5 }, .. })
        ));
        assert!(matches!(
            classify_status("10.1/a", StatusCode::SERVICE_UNAVAILABLE, 5),
            Err(backoff::Error::Transient { err: AppError::LookupFailed { .. }, .. })
        ));
        assert!(matches!(
            classify_status("10.1/a", StatusCode::BAD_REQUEST, 5),
            Err(backoff::Error::Permanent(AppError::LookupFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_retries_stop_at_cap() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retries("test", "10.1/a", 2, fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(backoff::Error::transient(AppError::RateLimited { limit: 5 })) }
        })
        .await;

        assert!(matches!(result, Err(AppError::RateLimited { limit: 5 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retries("test", "10.1/a", 5, fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(backoff::Error::permanent(AppError::LookupNotFound {
                    identifier: "10.1/a".to_string(),
                }))
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::LookupNotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let calls = AtomicU32::new(0);
        let result = with_retries("test", "10.1/a", 3, fast_policy(), || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(backoff::Error::transient(AppError::lookup("10.1/a", "API error 503")))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_fetcher_rejects_zero_budget() {
        let config = LookupConfig {
            requests_per_second: 0,
            ..Default::default()
        };
        assert!(matches!(
            HttpFetcher::new(&config),
            Err(AppError::Configuration { .. })
        ));
    }
}
