//! Exponential backoff over a classified set of transient failures
//!
//! Different vendors expose different exception taxonomies, so the
//! classifier matches on the error's type name and message text rather than
//! hard-coding a per-vendor hierarchy (see the spec's note on this
//! fragility). It is intentionally a substring test: "RateLimited",
//! "rate_limit: too many requests", and a raw "429 rate_limit_error" body
//! all match the same way.

use std::time::Duration;

use super::ProviderError;

const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "rate_limit",
    "ratelimit",
    "connection",
    "503",
    "529",
    "internalserver",
];

/// True if `err`'s type name or message contains one of the transient
/// markers, case-insensitively.
pub fn is_transient(err: &ProviderError) -> bool {
    let text = err.classification_text().to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Retry policy for `generate`/`stream` calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Additional attempts after the first failure.
    pub max_retries: usize,
    /// Base delay for `base * 2^attempt` backoff.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Exposed for the streaming path, which retries the pre-first-chunk
    /// connection attempt by hand instead of through [`retry_generate`]
    /// (a stream can't be produced from a plain `Result`-returning retry
    /// loop).
    pub(crate) fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exp = 1u32.checked_shl(attempt.min(20) as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(exp)
    }
}

/// Retry an async `generate`-shaped operation.
///
/// Transient failures sleep `base * 2^attempt` and retry, up to
/// `max_retries` additional attempts. A fatal (non-transient) failure, or
/// exhaustion of retries, surfaces the last error unchanged.
pub async fn retry_generate<F, Fut, T>(config: &RetryConfig, mut op: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_retries || !is_transient(&err) {
                    return Err(err);
                }
                tokio::time::sleep(config.delay_for_attempt(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn transient_markers_match_case_insensitively() {
        assert!(is_transient(&ProviderError::Timeout("Timeout waiting".into())));
        assert!(is_transient(&ProviderError::RateLimited("RATE_LIMIT hit".into())));
        assert!(is_transient(&ProviderError::Connection("Connection reset".into())));
        assert!(is_transient(&ProviderError::ServiceUnavailable {
            status: 503,
            message: "overloaded".into(),
        }));
        assert!(is_transient(&ProviderError::ServiceUnavailable {
            status: 529,
            message: "overloaded".into(),
        }));
        assert!(is_transient(&ProviderError::Other("InternalServerError".into())));
    }

    #[test]
    fn fatal_errors_are_not_transient() {
        assert!(!is_transient(&ProviderError::Authentication("bad key".into())));
        assert!(!is_transient(&ProviderError::Configuration("bad model".into())));
        assert!(!is_transient(&ProviderError::Model("content filtered".into())));
    }

    #[tokio::test]
    async fn retry_generate_stops_after_max_retries() {
        let config = RetryConfig {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let result: Result<(), ProviderError> = retry_generate(&config, || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Timeout("slow".into())) }
        })
        .await;

        assert!(result.is_err());
        // First attempt + 2 retries = 3 calls.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_generate_does_not_retry_fatal_errors() {
        let config = RetryConfig::new(5);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let result: Result<(), ProviderError> = retry_generate(&config, || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Authentication("bad key".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_generate_succeeds_after_transient_failures() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let result = retry_generate(&config, || {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::RateLimited("slow down".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
