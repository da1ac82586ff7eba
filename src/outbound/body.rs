//! Bounded reading of response bodies.

use super::{BodyError, ResponseBody};

/// Reads a response body into memory, up to `max_bytes`.
///
/// A `max_bytes` of `0` disables the limit and reads the whole body.
/// Otherwise the bytes received are counted as chunks arrive; once the count
/// goes past `max_bytes` reading stops with [`BodyError::TooLarge`], so a body
/// is never silently truncated and reported as complete. A body of exactly
/// `max_bytes` bytes is accepted.
///
/// The body is taken by value and dropped on every return path, which closes
/// the underlying stream.
///
/// # Errors
///
/// - [`BodyError::TooLarge`] if the body is longer than `max_bytes`
/// - [`BodyError::Read`] if the stream fails mid-read
///
/// # Example
///
/// ```
/// use httpx_exec::outbound::{ResponseBody, read_body};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let body = ResponseBody::from_bytes(&b"0123456789"[..]);
/// assert_eq!(read_body(body, 10).await.unwrap(), b"0123456789");
///
/// let body = ResponseBody::from_bytes(&b"0123456789!"[..]);
/// assert!(read_body(body, 10).await.is_err());
/// # }
/// ```
pub async fn read_body(mut body: ResponseBody, max_bytes: usize) -> Result<Vec<u8>, BodyError> {
    let mut buffer = Vec::new();

    while let Some(chunk) = body.next_chunk().await {
        let chunk = chunk?;

        if max_bytes > 0 && buffer.len().saturating_add(chunk.len()) > max_bytes {
            return Err(BodyError::TooLarge { limit: max_bytes });
        }

        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

/// Reads and discards at most about `max_bytes` of a body, then drops it.
///
/// Reading a short body to the end lets the transport reuse its connection.
/// A longer body is dropped once more than `max_bytes` have been read,
/// which closes the connection instead. Read errors end the drain.
pub async fn drain_body(mut body: ResponseBody, max_bytes: usize) {
    let mut drained = 0usize;

    while drained <= max_bytes {
        match body.next_chunk().await {
            Some(Ok(chunk)) => drained = drained.saturating_add(chunk.len()),
            Some(Err(_)) | None => break,
        }
    }
}
