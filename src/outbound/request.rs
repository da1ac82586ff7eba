//! Outbound request type.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http::header::{ACCEPT, HeaderName, HeaderValue};

use super::RequestError;

/// An HTTP request to be sent.
///
/// This is a value type that can be constructed once and dispatched any
/// number of times. The body is fully buffered, so every retry attempt
/// sends exactly the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: http::Method,
    /// Target URL
    pub url: url::Url,
    /// HTTP headers to send
    pub headers: http::HeaderMap,
    /// Optional request body
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a new HTTP request with the given method and URL.
    ///
    /// Headers are initialized to an empty map and body is `None`.
    #[must_use]
    pub fn new(method: http::Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: http::HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a GET request to the given URL.
    #[must_use]
    pub fn get(url: url::Url) -> Self {
        Self::new(http::Method::GET, url)
    }

    /// Creates a POST request to the given URL.
    #[must_use]
    pub fn post(url: url::Url) -> Self {
        Self::new(http::Method::POST, url)
    }

    /// Builds a request from loosely typed parts.
    ///
    /// Headers are set (not appended), so a later pair with the same name
    /// replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the method, URL or any header is invalid.
    ///
    /// # Example
    ///
    /// ```
    /// use httpx_exec::outbound::HttpRequest;
    ///
    /// let request = HttpRequest::build(
    ///     "POST",
    ///     "https://example.com/hook",
    ///     Some(b"{}".to_vec()),
    ///     [("Content-Type", "application/json")],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(request.method, http::Method::POST);
    /// assert_eq!(request.headers["content-type"], "application/json");
    /// ```
    pub fn build<'a, I>(
        method: &str,
        url: &str,
        body: Option<Vec<u8>>,
        headers: I,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let method = method
            .parse::<http::Method>()
            .map_err(|_| RequestError::InvalidMethod(method.to_string()))?;

        let url = url::Url::parse(url).map_err(|source| RequestError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let mut request = Self::new(method, url);
        request.body = body;

        for (name, value) in headers {
            let header_name = name
                .parse::<HeaderName>()
                .map_err(|_| RequestError::InvalidHeaderName(name.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| RequestError::InvalidHeaderValue(name.to_string()))?;
            request.headers.insert(header_name, header_value);
        }

        Ok(request)
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header to the request.
    ///
    /// If the header name already exists, the value is appended
    /// (HTTP headers can have multiple values).
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Returns the headers as they are sent, with transport defaults filled in.
    ///
    /// `Accept: */*` is added when the request sets no `Accept`. The
    /// transport sends this map and the request dump renders it.
    #[must_use]
    pub fn wire_headers(&self) -> http::HeaderMap {
        let mut headers = self.headers.clone();
        headers
            .entry(ACCEPT)
            .or_insert_with(|| HeaderValue::from_static("*/*"));
        headers
    }

    /// Returns the target host name without IPv6 brackets, if the URL has one.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.url
            .host_str()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']'))
    }
}

/// Returns the token for an HTTP Basic `Authorization` header.
///
/// The result is `base64(username:password)`; callers prefix it with `Basic `.
///
/// ```
/// assert_eq!(
///     httpx_exec::outbound::basic_auth("Aladdin", "open sesame"),
///     "QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
/// );
/// ```
#[must_use]
pub fn basic_auth(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}
