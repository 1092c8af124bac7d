//! Rate-limit backoff around a single provider lookup.
//!
//! Only [`GeocodeError::RateLimited`] is retried. Every other provider
//! failure is returned after the first attempt.

use std::future::Future;
use std::time::Duration;

use venuegeo_geocoder::GeocodeError;

use crate::cancel::CancelToken;

const MAX_DELAY_MS: u64 = 60_000;

/// Why a lookup gave up.
#[derive(Debug)]
pub(crate) enum LookupFailure {
    /// A non-retriable provider error.
    Provider(GeocodeError),
    /// Still rate limited after the last permitted retry.
    RetriesExhausted(GeocodeError),
    /// Cancellation arrived while waiting out a backoff delay.
    Cancelled,
}

/// Result of a lookup together with the number of provider calls it took.
#[derive(Debug)]
pub(crate) struct Attempted<T> {
    pub result: Result<T, LookupFailure>,
    pub attempts: u32,
}

/// Delay before retry number `retry` (1-based), before jitter.
///
/// `base_ms * 2^(retry - 1)`, raised to the provider's `Retry-After` hint
/// when that is longer, and capped at 60 s.
pub(crate) fn backoff_delay_ms(base_ms: u64, retry: u32, retry_after_secs: Option<u64>) -> u64 {
    let computed = base_ms.saturating_mul(1u64 << retry.saturating_sub(1).min(10));
    let hinted = retry_after_secs.map_or(0, |secs| secs.saturating_mul(1_000));
    computed.max(hinted).min(MAX_DELAY_MS)
}

/// Applies ±25 % jitter to `delay_ms`.
fn jittered(delay_ms: u64) -> u64 {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (delay_ms as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    jittered
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// has been retried `max_retries` times while rate limited.
///
/// Backoff sleeps race against `cancel`; a cancelled sleep ends the lookup
/// without another provider call.
pub(crate) async fn retry_rate_limited<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    cancel: &CancelToken,
    mut operation: F,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeocodeError>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let err = match operation().await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts,
                }
            }
            Err(err) => err,
        };

        let GeocodeError::RateLimited { retry_after_secs } = err else {
            return Attempted {
                result: Err(LookupFailure::Provider(err)),
                attempts,
            };
        };

        let retry = attempts;
        if retry > max_retries {
            return Attempted {
                result: Err(LookupFailure::RetriesExhausted(err)),
                attempts,
            };
        }

        // Jitter never cuts below the provider's own hint.
        let floor_ms = retry_after_secs
            .map_or(0, |secs| secs.saturating_mul(1_000))
            .min(MAX_DELAY_MS);
        let delay_ms = jittered(backoff_delay_ms(backoff_base_ms, retry, retry_after_secs))
            .clamp(floor_ms, MAX_DELAY_MS);
        tracing::warn!(
            attempt = retry,
            max_retries,
            delay_ms,
            error = %err,
            "geocoder rate limited; retrying after backoff"
        );

        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
            () = cancel.cancelled() => {
                return Attempted {
                    result: Err(LookupFailure::Cancelled),
                    attempts,
                };
            }
        }
    }
}
