//! Request execution: access check, dispatch, retry loop and tracing.

use std::time::SystemTime;

use crate::time::{Sleeper, TokioSleeper};

use super::{
    AccessPolicy, ExecuteError, HttpError, HttpRequest, HttpResponse, NoRetry, Requestor,
    RetryPolicy, Trace, TraceError, Unrestricted, drain_body, dump_request, dump_response_head,
    read_body,
};

/// Most bytes read from a retried response before it is dropped.
const RETRY_DRAIN_BYTES: usize = 64 * 1024;

/// Executes outbound requests through a requestor, with optional retry and
/// access policies.
///
/// Each call runs on the calling task with no shared mutable state, so one
/// executor can serve concurrent callers.
///
/// # Type Parameters
///
/// - `R`: The transport ([`Requestor`])
/// - `P`: The retry policy (defaults to [`NoRetry`])
/// - `A`: The access policy (defaults to [`Unrestricted`])
/// - `S`: The sleeper used between retries (defaults to [`TokioSleeper`])
///
/// # Example
///
/// ```no_run
/// use httpx_exec::outbound::{
///     Executor, ExponentialBackoff, HttpRequest, NetworkAccessPolicy, ReqwestRequestor,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = Executor::new(ReqwestRequestor::new()?)
///     .with_retry_policy(ExponentialBackoff::new().with_max_retries(2))
///     .with_access_policy(NetworkAccessPolicy::private());
///
/// let request = HttpRequest::get(url::Url::parse("https://example.com/")?);
/// let trace = executor.execute_traced(&request, 64 * 1024).await?;
/// println!("{}", trace.sanitized_response("[binary]"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Executor<R, P = NoRetry, A = Unrestricted, S = TokioSleeper> {
    requestor: R,
    retry_policy: P,
    access_policy: A,
    sleeper: S,
}

impl<R> Executor<R> {
    /// Creates an executor with no retries, no access restrictions and
    /// [`TokioSleeper`] for backoff delays.
    #[must_use]
    pub const fn new(requestor: R) -> Self {
        Self {
            requestor,
            retry_policy: NoRetry,
            access_policy: Unrestricted,
            sleeper: TokioSleeper,
        }
    }
}

impl<R, P, A, S> Executor<R, P, A, S> {
    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy<P2>(self, retry_policy: P2) -> Executor<R, P2, A, S> {
        Executor {
            requestor: self.requestor,
            retry_policy,
            access_policy: self.access_policy,
            sleeper: self.sleeper,
        }
    }

    /// Sets the access policy.
    #[must_use]
    pub fn with_access_policy<A2>(self, access_policy: A2) -> Executor<R, P, A2, S> {
        Executor {
            requestor: self.requestor,
            retry_policy: self.retry_policy,
            access_policy,
            sleeper: self.sleeper,
        }
    }

    /// Sets a custom sleeper for retry delays.
    ///
    /// This is primarily useful for testing to avoid actual delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> Executor<R, P, A, S2> {
        Executor {
            requestor: self.requestor,
            retry_policy: self.retry_policy,
            access_policy: self.access_policy,
            sleeper,
        }
    }

    /// Returns the requestor.
    #[must_use]
    pub const fn requestor(&self) -> &R {
        &self.requestor
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &P {
        &self.retry_policy
    }

    /// Returns the access policy.
    #[must_use]
    pub const fn access_policy(&self) -> &A {
        &self.access_policy
    }
}

impl<R, P, A, S> Executor<R, P, A, S>
where
    R: Requestor,
    P: RetryPolicy,
    A: AccessPolicy,
    S: Sleeper,
{
    /// Executes the request and returns the final response with its body unread.
    ///
    /// # Errors
    ///
    /// - [`ExecuteError::AccessDenied`] / [`ExecuteError::Access`] before any dispatch
    /// - [`ExecuteError::Transport`] if the final attempt failed
    pub async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ExecuteError> {
        self.dispatch(request).await.0
    }

    /// Executes the request, capturing a [`Trace`] of the full exchange.
    ///
    /// The response body is read into the trace through [`read_body`] with
    /// `max_body_bytes` as the limit (`0` = unbounded).
    ///
    /// # Errors
    ///
    /// Returns [`TraceError`] carrying the partially populated trace; see its
    /// documentation for which fields are set per error kind.
    pub async fn execute_traced(
        &self,
        request: &HttpRequest,
        max_body_bytes: usize,
    ) -> Result<Trace, TraceError> {
        let request_trace = dump_request(request).map_err(|e| TraceError::without_trace(e.into()))?;
        let mut trace = Trace::started(request.clone(), request_trace, SystemTime::now());

        let (outcome, retries) = self.dispatch(request).await;
        trace.end_time = SystemTime::now();
        trace.retries = retries;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => return Err(TraceError::with_trace(trace, e)),
        };

        let (head, body) = response.into_parts();
        trace.response_trace = dump_response_head(&head);
        trace.response = Some(head);

        match read_body(body, max_body_bytes).await {
            Ok(bytes) => {
                trace.response_body = bytes;
                Ok(trace)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, "Failed to read response body: {e}");
                Err(TraceError::with_trace(trace, e.into()))
            }
        }
    }

    /// Runs the access check and the retry loop, returning the final outcome
    /// and the number of retries performed.
    async fn dispatch(
        &self,
        request: &HttpRequest,
    ) -> (Result<HttpResponse, ExecuteError>, u32) {
        if let Err(e) = self.check_access(request).await {
            return (Err(e), 0);
        }

        let max_retries = self.retry_policy.max_retries();
        let mut retries = 0;

        loop {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                attempt = attempt_number(retries),
                "Dispatching request"
            );
            let outcome = self.requestor.send(request).await;

            if retries < max_retries {
                let backoff = self.retry_policy.backoff(retries);

                if self
                    .retry_policy
                    .should_retry(request, outcome.as_ref(), backoff)
                {
                    tracing::info!(
                        url = %request.url,
                        retry = attempt_number(retries),
                        max_retries,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "Retrying request: {}",
                        describe(&outcome)
                    );
                    if let Ok(response) = outcome {
                        drain_body(response.body, RETRY_DRAIN_BYTES).await;
                    }
                    self.sleeper.sleep(backoff).await;
                    retries += 1;
                    continue;
                }
            }

            return (outcome.map_err(ExecuteError::from), retries);
        }
    }

    async fn check_access(&self, request: &HttpRequest) -> Result<(), ExecuteError> {
        if self.access_policy.allow(request).await? {
            return Ok(());
        }

        let host = request.host().unwrap_or_default().to_string();
        tracing::warn!(host = %host, url = %request.url, "Request denied by access policy");
        Err(ExecuteError::AccessDenied { host })
    }
}

/// One-based attempt number for the attempt after `retries` retries.
pub(super) const fn attempt_number(retries: u32) -> u32 {
    retries.saturating_add(1)
}

fn describe(outcome: &Result<HttpResponse, HttpError>) -> String {
    match outcome {
        Ok(response) => format!("status {}", response.status),
        Err(e) => e.to_string(),
    }
}
