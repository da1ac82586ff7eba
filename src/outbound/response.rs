//! Response types: the head of a response and its streamed body.

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use tokio_stream::{Stream, StreamExt};

use super::HttpError;

/// Boxed stream of body chunks.
type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// A streamed response body.
///
/// Chunks are pulled on demand, so a body is never buffered unless the
/// caller reads it. Dropping the body closes the underlying stream (and,
/// for network transports, releases the connection).
pub struct ResponseBody {
    inner: ChunkStream,
}

impl ResponseBody {
    /// Creates an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_stream(tokio_stream::empty())
    }

    /// Creates a body that yields the given bytes as a single chunk.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Self::empty();
        }
        Self::from_stream(tokio_stream::once(Ok(bytes)))
    }

    /// Creates a body that yields each chunk in order.
    #[must_use]
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        I::IntoIter: Send + 'static,
        B: Into<Bytes> + 'static,
    {
        Self::from_stream(tokio_stream::iter(chunks).map(|chunk| Ok(chunk.into())))
    }

    /// Wraps an arbitrary chunk stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, HttpError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Returns the next chunk, or `None` when the body is exhausted.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes, HttpError>> {
        self.inner.next().await
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

/// Status line and headers of a response, without the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Protocol version the response was received with
    pub version: http::Version,
    /// Response headers
    pub headers: http::HeaderMap,
}

/// An HTTP response received from a server.
///
/// The body is a stream that is consumed at most once.
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Protocol version
    pub version: http::Version,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Response body (streamed)
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Creates a new HTTP/1.1 response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            version: http::Version::HTTP_11,
            headers,
            body,
        }
    }

    /// Sets the protocol version.
    #[must_use]
    pub const fn with_version(mut self, version: http::Version) -> Self {
        self.version = version;
        self
    }

    /// Separates the head from the body stream.
    #[must_use]
    pub fn into_parts(self) -> (ResponseHead, ResponseBody) {
        let head = ResponseHead {
            status: self.status,
            version: self.version,
            headers: self.headers,
        };
        (head, self.body)
    }
}
