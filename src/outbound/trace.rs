//! Captured request/response traces and their text-safe rendering.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use super::{HttpRequest, ResponseHead, detect_content_type};

/// Marker substituted for invalid UTF-8 and NUL bytes.
const REPLACEMENT: &str = "\u{FFFD}";

/// Separator between the header section and the body of a dump.
const HEADER_END: &[u8] = b"\r\n\r\n";

/// The complete trace of one logical call.
///
/// Produced by [`Executor::execute_traced`](super::Executor::execute_traced).
/// The request dump is captured before the first attempt; the response
/// fields describe the final attempt only and are populated only if a
/// response was received. `response_body` is never set without `response`.
#[derive(Debug, Clone)]
pub struct Trace {
    /// The request that was sent
    pub request: HttpRequest,
    /// Wire form of the request, body included
    pub request_trace: Vec<u8>,
    /// Status and headers of the final response
    pub response: Option<ResponseHead>,
    /// Wire form of the response head (status line and headers)
    pub response_trace: Vec<u8>,
    /// Response body, captured separately and bounded
    pub response_body: Vec<u8>,
    /// When the call started
    pub start_time: SystemTime,
    /// When the call resolved
    pub end_time: SystemTime,
    /// Number of retries performed
    pub retries: u32,
}

impl Trace {
    /// Creates a trace for a request that is about to be dispatched.
    #[must_use]
    pub fn started(request: HttpRequest, request_trace: Vec<u8>, start_time: SystemTime) -> Self {
        Self {
            request,
            request_trace,
            response: None,
            response_trace: Vec::new(),
            response_body: Vec::new(),
            start_time,
            end_time: start_time,
            retries: 0,
        }
    }

    /// Returns the wall-clock time between start and end.
    ///
    /// Zero if the system clock went backwards during the call.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.end_time
            .duration_since(self.start_time)
            .unwrap_or_default()
    }

    /// Returns the request as valid UTF-8.
    ///
    /// The header section has invalid sequences replaced; the body is kept
    /// if it is valid UTF-8 and replaced by `placeholder` otherwise. NUL
    /// bytes are replaced everywhere since some stores reject them.
    #[must_use]
    pub fn sanitized_request(&self, placeholder: &str) -> String {
        let (headers, body) = split_dump(&self.request_trace);
        sanitize(headers, body, placeholder)
    }

    /// Returns the response as valid UTF-8, following the same rules as
    /// [`sanitized_request`](Self::sanitized_request).
    #[must_use]
    pub fn sanitized_response(&self, placeholder: &str) -> String {
        sanitize(&self.response_trace, &self.response_body, placeholder)
    }

    /// Returns a serializable summary with sanitized dumps.
    #[must_use]
    pub fn summary(&self, placeholder: &str) -> TraceSummary {
        TraceSummary {
            method: self.request.method.to_string(),
            url: self.request.url.to_string(),
            status: self.response.as_ref().map(|r| r.status.as_u16()),
            retries: self.retries,
            started_at_ms: unix_millis(self.start_time),
            elapsed_ms: u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX),
            request: self.sanitized_request(placeholder),
            response: self
                .response
                .is_some()
                .then(|| self.sanitized_response(placeholder)),
            body_type: self
                .response
                .is_some()
                .then(|| detect_content_type(&self.response_body)),
        }
    }
}

/// Combined raw dump of request and response, for logging.
///
/// Invalid UTF-8 is rendered lossily; use the sanitized renderers for
/// anything that is stored.
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">>>>>>>> {} {}", self.request.method, self.request.url)?;
        f.write_str(&String::from_utf8_lossy(&self.request_trace))?;
        f.write_str("\n<<<<<<<<\n")?;
        f.write_str(&String::from_utf8_lossy(&self.response_trace))?;
        f.write_str(&String::from_utf8_lossy(&self.response_body))
    }
}

/// JSON-friendly view of a [`Trace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    /// Request method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Final response status, if a response was received
    pub status: Option<u16>,
    /// Retries performed
    pub retries: u32,
    /// Start time in milliseconds since the Unix epoch
    pub started_at_ms: u64,
    /// Call duration in milliseconds
    pub elapsed_ms: u64,
    /// Sanitized request
    pub request: String,
    /// Sanitized response, if a response was received
    pub response: Option<String>,
    /// Media type detected from the response body, if a response was received
    pub body_type: Option<String>,
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Splits a dump at the first blank line. The separator stays with the
/// headers; without one the whole dump is headers and the body is empty.
fn split_dump(dump: &[u8]) -> (&[u8], &[u8]) {
    dump.windows(HEADER_END.len())
        .position(|window| window == HEADER_END)
        .map_or((dump, &[][..]), |pos| dump.split_at(pos + HEADER_END.len()))
}

/// Renders a header section and body as valid UTF-8 with no NUL bytes.
#[must_use]
pub fn sanitize(headers: &[u8], body: &[u8], placeholder: &str) -> String {
    let mut out = to_valid_utf8(headers).replace('\0', REPLACEMENT);

    match std::str::from_utf8(body) {
        Ok(text) => out.push_str(&text.replace('\0', REPLACEMENT)),
        Err(_) => out.push_str(placeholder),
    }

    out
}

/// Decodes bytes as UTF-8, replacing each run of invalid bytes with a
/// single replacement character.
fn to_valid_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut in_invalid_run = false;

    for chunk in bytes.utf8_chunks() {
        let valid = chunk.valid();
        if !valid.is_empty() {
            out.push_str(valid);
            in_invalid_run = false;
        }
        if !chunk.invalid().is_empty() {
            if !in_invalid_run {
                out.push_str(REPLACEMENT);
            }
            in_invalid_run = true;
        }
    }

    out
}
