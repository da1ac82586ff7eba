//! Error types for outbound HTTP execution.

use thiserror::Error;

use super::Trace;

/// Error type for a single transport exchange.
///
/// Describes what went wrong without dictating recovery strategy.
/// Whether any of these is retried is up to the configured
/// [`RetryPolicy`](super::RetryPolicy).
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// TLS failures and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the transport's timeout period.
    #[error("Request timed out")]
    Timeout,

    /// The provided URL is invalid.
    ///
    /// This typically indicates a configuration error rather than
    /// a transient failure.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The response body stream failed after the headers were received.
    #[error("Failed to read response body: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Error raised while building an [`HttpRequest`](super::HttpRequest).
#[derive(Debug, Error)]
pub enum RequestError {
    /// The URL could not be parsed.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL string
        url: String,
        /// Underlying parse error
        #[source]
        source: url::ParseError,
    },

    /// The method is not a valid HTTP token.
    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// A header name is not a valid HTTP token.
    #[error("Invalid header name '{0}'")]
    InvalidHeaderName(String),

    /// A header value contains forbidden characters.
    #[error("Invalid header value for '{0}'")]
    InvalidHeaderValue(String),
}

/// Error raised by an [`AccessPolicy`](super::AccessPolicy) while evaluating a request.
///
/// Distinct from a denial: an evaluation error means the policy could not
/// decide, and the executor fails closed.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The request URL has no host to check.
    #[error("Request URL '{0}' has no host")]
    MissingHost(String),

    /// Resolving the target host failed.
    #[error("Failed to resolve host '{host}': {source}")]
    Resolve {
        /// Host being resolved
        host: String,
        /// Underlying resolver error
        #[source]
        source: std::io::Error,
    },
}

/// Error raised while reading a response body.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body was larger than the configured limit.
    #[error("response body exceeds {limit} bytes limit")]
    TooLarge {
        /// The configured limit in bytes
        limit: usize,
    },

    /// The body stream failed mid-read.
    #[error(transparent)]
    Read(#[from] HttpError),
}

/// Error raised while rendering a request to its wire form.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The URL has no host, so no `Host` header can be written.
    #[error("Cannot dump request to '{0}': URL has no host")]
    MissingHost(String),
}

/// Error returned by [`Executor`](super::Executor) operations.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The access policy rejected the target host. Never retried.
    #[error("request to {host} denied")]
    AccessDenied {
        /// Host named in the rejected request
        host: String,
    },

    /// The access policy could not evaluate the request. Never retried.
    #[error("Access check failed: {0}")]
    Access(#[from] AccessError),

    /// The transport failed on the final attempt.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// Reading the response body failed or exceeded the limit.
    #[error(transparent)]
    Body(#[from] BodyError),

    /// The request could not be rendered for the trace.
    #[error(transparent)]
    Dump(#[from] DumpError),
}

impl ExecuteError {
    /// Returns true if this error is an access denial.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Returns true if the response body exceeded the configured limit.
    #[must_use]
    pub const fn is_body_too_large(&self) -> bool {
        matches!(self, Self::Body(BodyError::TooLarge { .. }))
    }
}

/// Error returned by [`Executor::execute_traced`](super::Executor::execute_traced).
///
/// Carries whatever part of the [`Trace`] was captured before the failure.
/// Which fields are populated depends on the error kind:
///
/// | `source`                                     | `trace`                                              |
/// |----------------------------------------------|------------------------------------------------------|
/// | [`ExecuteError::Dump`]                       | `None`                                               |
/// | `AccessDenied`, `Access`, `Transport`        | request dump, timestamps, retry count                |
/// | [`ExecuteError::Body`]                       | as above plus response head and header dump, no body |
#[derive(Debug, Error)]
#[error("{source}")]
pub struct TraceError {
    /// The partially populated trace, if the request could be dumped.
    pub trace: Option<Box<Trace>>,
    /// What went wrong.
    #[source]
    pub source: ExecuteError,
}

impl TraceError {
    /// Creates an error without any captured trace.
    #[must_use]
    pub const fn without_trace(source: ExecuteError) -> Self {
        Self {
            trace: None,
            source,
        }
    }

    /// Creates an error carrying a partially populated trace.
    #[must_use]
    pub fn with_trace(trace: Trace, source: ExecuteError) -> Self {
        Self {
            trace: Some(Box::new(trace)),
            source,
        }
    }

    /// Returns the captured trace, if any.
    #[must_use]
    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_deref()
    }
}
