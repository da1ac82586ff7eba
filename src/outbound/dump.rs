//! Wire-form rendering of requests and response heads.
//!
//! Dumps follow HTTP/1.1 framing: a start line, one `Name: value` line per
//! header, a blank line, then (for requests) the body bytes. Header values are
//! written as raw bytes, so a dump is not guaranteed to be valid UTF-8.

use std::io::Write as _;

use http::header::{CONTENT_LENGTH, HOST};

use super::{DumpError, HttpRequest, ResponseHead};

const CRLF: &[u8] = b"\r\n";

/// Renders a request exactly as it would appear on the wire, body included.
///
/// Headers come from [`HttpRequest::wire_headers`], the same map the
/// transport sends. A `Host` header is derived from the URL unless one is
/// already set, and a `Content-Length` header is added for requests with a
/// body.
///
/// # Errors
///
/// Returns [`DumpError::MissingHost`] if the URL has no host.
pub fn dump_request(request: &HttpRequest) -> Result<Vec<u8>, DumpError> {
    let url = &request.url;
    let host = url
        .host_str()
        .ok_or_else(|| DumpError::MissingHost(url.to_string()))?;

    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let headers = request.wire_headers();
    let mut out = Vec::new();
    // Writes into a Vec are infallible.
    let _ = write!(out, "{} {target} HTTP/1.1\r\n", request.method);

    if !headers.contains_key(HOST) {
        match url.port() {
            Some(port) => {
                let _ = write!(out, "Host: {host}:{port}\r\n");
            }
            None => {
                let _ = write!(out, "Host: {host}\r\n");
            }
        }
    }

    write_headers(&mut out, &headers);

    if let Some(body) = &request.body {
        if !headers.contains_key(CONTENT_LENGTH) {
            let _ = write!(out, "Content-Length: {}\r\n", body.len());
        }
        out.extend_from_slice(CRLF);
        out.extend_from_slice(body);
    } else {
        out.extend_from_slice(CRLF);
    }

    Ok(out)
}

/// Renders the status line and headers of a response, ending with the blank
/// line that separates them from the body.
#[must_use]
pub fn dump_response_head(head: &ResponseHead) -> Vec<u8> {
    let mut out = Vec::new();
    let reason = head.status.canonical_reason().unwrap_or("");
    let _ = write!(
        out,
        "{:?} {} {reason}\r\n",
        head.version,
        head.status.as_u16()
    );

    write_headers(&mut out, &head.headers);
    out.extend_from_slice(CRLF);
    out
}

fn write_headers(out: &mut Vec<u8>, headers: &http::HeaderMap) {
    for (name, value) in headers {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(CRLF);
    }
}
