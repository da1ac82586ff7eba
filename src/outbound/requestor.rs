//! Transport abstraction and the production reqwest implementation.

use std::future::Future;
use std::sync::Arc;

use tokio_stream::StreamExt;

use super::{HttpError, HttpRequest, HttpResponse, ResponseBody};

/// Trait for performing one request/response exchange.
///
/// # Design
///
/// The executor is constructed with a requestor instead of reaching for a
/// process-wide transport, enabling:
/// - Dependency injection of test doubles per executor
/// - Swapping HTTP libraries without changing calling code
///
/// The request is borrowed because the executor dispatches the same request
/// again on every retry.
///
/// # Example
///
/// ```ignore
/// use httpx_exec::outbound::{HttpError, HttpRequest, HttpResponse, Requestor, ResponseBody};
///
/// struct AlwaysOk;
///
/// impl Requestor for AlwaysOk {
///     async fn send(&self, _req: &HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(HttpResponse::new(http::StatusCode::OK, http::HeaderMap::new(), ResponseBody::empty()))
///     }
/// }
/// ```
pub trait Requestor: Send + Sync {
    /// Sends the request and returns the response with an unread body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] when:
    /// - Network connection fails ([`HttpError::Connection`])
    /// - Request times out ([`HttpError::Timeout`])
    /// - URL is invalid ([`HttpError::InvalidUrl`])
    fn send(
        &self,
        req: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}

impl<R: Requestor> Requestor for Arc<R> {
    fn send(
        &self,
        req: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send {
        (**self).send(req)
    }
}

/// Production requestor using reqwest.
///
/// This is a thin wrapper around `reqwest::Client`. Connection pooling,
/// TLS and protocol negotiation are left entirely to reqwest.
///
/// Redirects are never followed: a `3xx` is returned as the final response.
/// The access policy only vets the request URL, so a followed `Location`
/// would reach hosts it never saw.
///
/// # Example
///
/// ```no_run
/// use httpx_exec::outbound::{HttpRequest, ReqwestRequestor, Requestor};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let requestor = ReqwestRequestor::new()?;
/// let url = Url::parse("https://api.example.com/webhook")?;
/// let request = HttpRequest::post(url).with_body(b"hello".to_vec());
/// let response = requestor.send(&request).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestRequestor {
    inner: reqwest::Client,
}

impl ReqwestRequestor {
    /// Creates a requestor from [`client_builder`](Self::client_builder)
    /// with no further configuration.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::client_builder().build().map(Self::from_client)
    }

    /// Returns a reqwest client builder with redirects disabled.
    ///
    /// Start from this builder for any client passed to
    /// [`from_client`](Self::from_client).
    #[must_use]
    pub fn client_builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder().redirect(reqwest::redirect::Policy::none())
    }

    /// Creates a requestor from an existing reqwest client.
    ///
    /// Useful when you need custom configuration (timeouts, TLS, etc.).
    /// The client must not follow redirects; build it from
    /// [`client_builder`](Self::client_builder).
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

fn classify(error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout
    } else if error.is_builder() {
        HttpError::InvalidUrl(error.to_string())
    } else {
        HttpError::Connection(Box::new(error))
    }
}

impl Requestor for ReqwestRequestor {
    async fn send(&self, req: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self
            .inner
            .request(req.method.clone(), req.url.as_str())
            .headers(req.wire_headers());

        if let Some(body) = &req.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = ResponseBody::from_stream(response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout
                } else {
                    HttpError::Body(Box::new(e))
                }
            })
        }));

        Ok(HttpResponse::new(status, headers, body).with_version(version))
    }
}
