//! Media type detection from body bytes.

const OCTET_STREAM: &str = "application/octet-stream";
const JSON: &str = "application/json";
const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Guesses the media type of a body from its content.
///
/// Binary formats are recognised by their magic numbers. Other valid UTF-8
/// is `application/json` when it parses as a JSON object or array and
/// `text/plain; charset=utf-8` otherwise. Empty input and unrecognised
/// binary data are `application/octet-stream`.
///
/// ```
/// use httpx_exec::outbound::detect_content_type;
///
/// assert_eq!(detect_content_type(br#"{"ok":true}"#), "application/json");
/// assert_eq!(detect_content_type(b""), "application/octet-stream");
/// ```
#[must_use]
pub fn detect_content_type(data: &[u8]) -> String {
    if data.is_empty() {
        return OCTET_STREAM.to_string();
    }

    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    match std::str::from_utf8(data) {
        Ok(text) if is_json_document(text) => JSON.to_string(),
        Ok(_) => PLAIN_TEXT.to_string(),
        Err(_) => OCTET_STREAM.to_string(),
    }
}

fn is_json_document(text: &str) -> bool {
    let trimmed = text.trim_start();
    (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok()
}
