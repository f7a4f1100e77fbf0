use crate::error::ApiError;
use configuration::RetryConfig;
use std::future::Future;
use std::time::Duration;

/// Runs `op` up to `config.max_attempts` times, sleeping with exponential
/// backoff between attempts. Only transient errors (see
/// [`ApiError::is_transient`]) are retried; anything else is returned at once.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, what: &str, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && e.is_transient() => {
                let delay = backoff(config.base_delay, attempt);
                tracing::warn!(
                    request = what,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient collector failure, retrying."
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    fn server_error() -> ApiError {
        ApiError::Status { status: 503, body: "unavailable".into() }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = Cell::new(0);
        let result = with_retry(&config(3), "test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 3 { Err(server_error()) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn single_attempt_means_no_retry() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&config(1), "test", || {
            calls.set(calls.get() + 1);
            async { Err(server_error()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(&config(5), "test", || {
            calls.set(calls.get() + 1);
            async { Err(ApiError::Status { status: 401, body: "no".into() }) }
        })
        .await;

        assert!(matches!(result, Err(ApiError::Status { status: 401, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn backoff_doubles() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff(base, 1), Duration::from_millis(100));
        assert_eq!(backoff(base, 3), Duration::from_millis(400));
    }
}
