//! Tests for retry policies.

use std::time::Duration;

use super::{
    ExponentialBackoff, HttpError, HttpRequest, HttpResponse, IsRetryable, NoRetry, ResponseBody,
    RetryPolicy, is_retryable_status,
};

fn request() -> HttpRequest {
    HttpRequest::get(url::Url::parse("https://example.com/").unwrap())
}

fn response(status: u16) -> HttpResponse {
    HttpResponse::new(
        http::StatusCode::from_u16(status).unwrap(),
        http::HeaderMap::new(),
        ResponseBody::empty(),
    )
}

fn response_with_retry_after(status: u16, value: &'static str) -> HttpResponse {
    let mut resp = response(status);
    resp.headers.insert(
        http::header::RETRY_AFTER,
        http::HeaderValue::from_static(value),
    );
    resp
}

mod no_retry {
    use super::*;

    #[test]
    fn has_zero_budget() {
        assert_eq!(NoRetry.max_retries(), 0);
        assert_eq!(NoRetry.backoff(3), Duration::ZERO);
    }

    #[test]
    fn never_retries() {
        let err = HttpError::Timeout;

        assert!(!NoRetry.should_retry(&request(), Err(&err), Duration::ZERO));
        assert!(!NoRetry.should_retry(&request(), Ok(&response(503)), Duration::ZERO));
    }
}

mod exponential_defaults {
    use super::*;

    #[test]
    fn new_creates_policy_with_defaults() {
        let policy = ExponentialBackoff::new();

        assert_eq!(policy.max_retries, ExponentialBackoff::DEFAULT_MAX_RETRIES);
        assert_eq!(policy.initial_delay, ExponentialBackoff::DEFAULT_INITIAL_DELAY);
        assert_eq!(policy.max_delay, ExponentialBackoff::DEFAULT_MAX_DELAY);
        assert!((policy.multiplier - ExponentialBackoff::DEFAULT_MULTIPLIER).abs() < f64::EPSILON);
    }

    #[test]
    fn default_trait_matches_new() {
        assert_eq!(ExponentialBackoff::new(), ExponentialBackoff::default());
    }
}

mod exponential_builder {
    use super::*;

    #[test]
    fn with_max_retries_allows_zero() {
        let policy = ExponentialBackoff::new().with_max_retries(0);
        assert_eq!(policy.max_retries(), 0);
    }

    #[test]
    fn with_delays_set_values() {
        let policy = ExponentialBackoff::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(120));

        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(120));
    }

    #[test]
    #[should_panic(expected = "multiplier must be positive")]
    fn with_multiplier_zero_panics() {
        let _ = ExponentialBackoff::new().with_multiplier(0.0);
    }
}

mod backoff {
    use super::*;

    #[test]
    fn doubles_each_attempt() {
        let policy = ExponentialBackoff::new()
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(100));

        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn is_capped_at_max_delay() {
        let policy = ExponentialBackoff::new()
            .with_initial_delay(Duration::from_secs(10))
            .with_max_delay(Duration::from_secs(30));

        assert_eq!(policy.backoff(5), Duration::from_secs(30));
    }

    #[test]
    fn huge_attempt_index_is_capped() {
        let policy = ExponentialBackoff::new();

        assert_eq!(policy.backoff(u32::MAX), ExponentialBackoff::DEFAULT_MAX_DELAY);
    }

    #[test]
    fn is_deterministic() {
        let policy = ExponentialBackoff::new().with_multiplier(1.5);

        assert_eq!(policy.backoff(4), policy.backoff(4));
    }
}

mod should_retry {
    use super::*;

    fn policy() -> ExponentialBackoff {
        ExponentialBackoff::new()
    }

    #[test]
    fn retries_transient_transport_errors() {
        let timeout = HttpError::Timeout;
        let connection = HttpError::Connection(Box::new(std::io::Error::other("refused")));

        assert!(policy().should_retry(&request(), Err(&timeout), Duration::from_secs(1)));
        assert!(policy().should_retry(&request(), Err(&connection), Duration::from_secs(1)));
    }

    #[test]
    fn does_not_retry_invalid_url() {
        let err = HttpError::InvalidUrl("bad".to_string());

        assert!(!policy().should_retry(&request(), Err(&err), Duration::from_secs(1)));
    }

    #[test]
    fn retries_retryable_statuses() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(
                policy().should_retry(&request(), Ok(&response(status)), Duration::from_secs(1)),
                "expected {status} to be retried"
            );
        }
    }

    #[test]
    fn does_not_retry_success_or_client_errors() {
        for status in [200, 201, 204, 301, 400, 401, 403, 404] {
            assert!(
                !policy().should_retry(&request(), Ok(&response(status)), Duration::from_secs(1)),
                "expected {status} not to be retried"
            );
        }
    }

    #[test]
    fn retry_after_within_backoff_is_retried() {
        let resp = response_with_retry_after(503, "2");

        assert!(policy().should_retry(&request(), Ok(&resp), Duration::from_secs(2)));
    }

    #[test]
    fn retry_after_longer_than_backoff_is_not_retried() {
        let resp = response_with_retry_after(429, "120");

        assert!(!policy().should_retry(&request(), Ok(&resp), Duration::from_secs(1)));
    }

    #[test]
    fn unparseable_retry_after_is_ignored() {
        let resp = response_with_retry_after(503, "Wed, 21 Oct 2015 07:28:00 GMT");

        assert!(policy().should_retry(&request(), Ok(&resp), Duration::from_secs(1)));
    }
}

mod retryable_classification {
    use super::*;

    #[test]
    fn body_errors_are_retryable() {
        let err = HttpError::Body(Box::new(std::io::Error::other("reset")));
        assert!(err.is_retryable());
    }

    #[test]
    fn status_helper_matches_policy() {
        assert!(is_retryable_status(http::StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(http::StatusCode::NOT_FOUND));
    }
}
