//! Outbound HTTP execution layer.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`]) and reading responses ([`HttpResponse`])
//! - Abstracting the transport ([`Requestor`]) with a reqwest implementation ([`ReqwestRequestor`])
//! - Retry policies ([`RetryPolicy`], [`ExponentialBackoff`])
//! - Pre-dispatch access control ([`AccessPolicy`], [`NetworkAccessPolicy`])
//! - Bounded body reading ([`read_body`]) and media type detection ([`detect_content_type`])
//! - Executing requests with optional tracing ([`Executor`], [`Trace`])

mod access;
mod body;
mod content_type;
mod dump;
mod error;
mod executor;
mod request;
mod requestor;
mod response;
mod retry;
mod trace;

#[cfg(test)]
mod access_tests;
#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod requestor_tests;
#[cfg(test)]
mod retry_tests;

pub use access::{
    AccessPolicy, IpNetwork, NetworkAccessPolicy, ParseNetworkError, Unrestricted,
    private_networks,
};
pub use body::{drain_body, read_body};
pub use content_type::detect_content_type;
pub use dump::{dump_request, dump_response_head};
pub use error::{
    AccessError, BodyError, DumpError, ExecuteError, HttpError, RequestError, TraceError,
};
pub use executor::Executor;
pub use request::{HttpRequest, basic_auth};
pub use requestor::{ReqwestRequestor, Requestor};
pub use response::{HttpResponse, ResponseBody, ResponseHead};
pub use retry::{ExponentialBackoff, IsRetryable, NoRetry, RetryPolicy, is_retryable_status};
pub use trace::{Trace, TraceSummary, sanitize};
