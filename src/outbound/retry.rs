//! Retry policies for outbound requests.

use std::time::Duration;

use http::header::RETRY_AFTER;

use super::{HttpError, HttpRequest, HttpResponse};

/// Decides whether, and after how long, a request is retried.
///
/// The executor treats a policy as an opaque oracle: it asks for the retry
/// budget, computes the backoff for the current attempt index, and asks
/// whether the outcome of the last attempt warrants another one. It never
/// interprets response semantics itself.
///
/// Implementations must be stateless across calls: the same inputs always
/// produce the same decision.
pub trait RetryPolicy: Send + Sync {
    /// Maximum number of retries after the initial attempt.
    fn max_retries(&self) -> u32;

    /// Delay before retry number `attempt` (0 = delay before the first retry).
    fn backoff(&self, attempt: u32) -> Duration;

    /// Returns true if the outcome of the last attempt should be retried
    /// after waiting `backoff`.
    fn should_retry(
        &self,
        request: &HttpRequest,
        outcome: Result<&HttpResponse, &HttpError>,
        backoff: Duration,
    ) -> bool;
}

/// Policy that never retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn max_retries(&self) -> u32 {
        0
    }

    fn backoff(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }

    fn should_retry(
        &self,
        _request: &HttpRequest,
        _outcome: Result<&HttpResponse, &HttpError>,
        _backoff: Duration,
    ) -> bool {
        false
    }
}

/// Exponential backoff with a status- and error-based retry predicate.
///
/// Retries transient transport failures ([`IsRetryable`]) and responses with
/// status 408, 429 or 5xx. A response carrying a `Retry-After` (in seconds)
/// longer than the computed backoff is not retried, since waiting less than
/// the server asked would be pointless.
///
/// # Defaults
///
/// - `max_retries`: 3
/// - `initial_delay`: 1 second
/// - `max_delay`: 30 seconds
/// - `multiplier`: 2.0
///
/// # Example
///
/// ```
/// use httpx_exec::outbound::{ExponentialBackoff, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = ExponentialBackoff::new()
///     .with_max_retries(5)
///     .with_initial_delay(Duration::from_millis(500))
///     .with_max_delay(Duration::from_secs(10))
///     .with_multiplier(1.5);
///
/// assert_eq!(policy.max_retries(), 5);
/// assert_eq!(policy.backoff(0), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    /// Maximum number of retries after the initial attempt.
    ///
    /// A value of 0 means only the initial attempt is made.
    pub max_retries: u32,

    /// Delay before the first retry.
    ///
    /// Subsequent delays are computed by multiplying by `multiplier`.
    pub initial_delay: Duration,

    /// Maximum delay between retries.
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,
}

impl ExponentialBackoff {
    /// Default maximum retries.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Default initial delay (1 second).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

    /// Default maximum delay (30 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Creates a new policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial delay between retries.
    ///
    /// Zero delay is supported (useful for testing with [`InstantSleeper`])
    /// but not recommended for production as it creates a tight retry loop.
    ///
    /// [`InstantSleeper`]: crate::time::InstantSleeper
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is not positive (must be > 0.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "multiplier must be positive");
        self.multiplier = multiplier;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn backoff(&self, attempt: u32) -> Duration {
        // Saturate the exponent; the cap below makes anything larger moot.
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    fn should_retry(
        &self,
        _request: &HttpRequest,
        outcome: Result<&HttpResponse, &HttpError>,
        backoff: Duration,
    ) -> bool {
        match outcome {
            Err(error) => error.is_retryable(),
            Ok(response) => {
                is_retryable_status(response.status)
                    && retry_after(&response.headers).is_none_or(|wait| wait <= backoff)
            }
        }
    }
}

/// Returns true for statuses that usually indicate a transient condition.
#[must_use]
pub fn is_retryable_status(status: http::StatusCode) -> bool {
    status.is_server_error()
        || status == http::StatusCode::TOO_MANY_REQUESTS
        || status == http::StatusCode::REQUEST_TIMEOUT
}

/// Parses a `Retry-After` header given in delta-seconds.
///
/// HTTP-date values are ignored.
fn retry_after(headers: &http::HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Extension trait for checking if an error is retryable.
///
/// Determines whether an error represents a transient failure that
/// warrants a retry attempt.
pub trait IsRetryable {
    /// Returns true if the error is potentially transient and should be retried.
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            // Network errors are typically transient
            Self::Connection(_) | Self::Timeout | Self::Body(_) => true,
            // URL errors are configuration issues, not transient
            Self::InvalidUrl(_) => false,
        }
    }
}
