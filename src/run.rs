//! Application execution logic.
//!
//! This module builds the executor from the validated config, performs one
//! traced call and writes the captured exchange in the configured format.

use std::io::Write;

use thiserror::Error;

use httpx_exec::config::{OutputFormat, ValidatedConfig};
use httpx_exec::outbound::{Executor, ReqwestRequestor, Trace, TraceError};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The call failed; any partial trace has already been written.
    #[error("Request failed: {0}")]
    Request(#[source] TraceError),

    /// Failed to serialize the JSON summary.
    #[error("Failed to render JSON output: {0}")]
    Render(#[source] serde_json::Error),

    /// Failed to write the output.
    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl RunError {
    /// Returns true if the access policy refused the request.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::Request(e) if e.source.is_access_denied())
    }
}

/// Executes the configured request and writes its trace to `out`.
///
/// When the call fails after a request was dumped, the partial trace is
/// still written before the error is returned.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be built
/// - The call fails (access denial, transport error, oversized body)
/// - The output cannot be rendered or written
pub async fn execute<W: Write>(config: ValidatedConfig, out: &mut W) -> Result<(), RunError> {
    let client = ReqwestRequestor::client_builder()
        .timeout(config.timeout)
        .build()
        .map_err(RunError::ClientBuild)?;

    let executor = Executor::new(ReqwestRequestor::from_client(client))
        .with_retry_policy(config.retry_policy)
        .with_access_policy(config.access_policy);

    let result = executor
        .execute_traced(&config.request, config.max_body_bytes)
        .await;

    let (trace, error) = match result {
        Ok(trace) => (Some(trace), None),
        Err(mut e) => (e.trace.take().map(|t| *t), Some(e)),
    };

    if let Some(ref trace) = trace {
        tracing::debug!("Captured exchange:\n{trace}");
        log_outcome(trace);

        let rendered = render(trace, config.output, &config.placeholder)?;
        out.write_all(&rendered).map_err(RunError::Output)?;
        out.flush().map_err(RunError::Output)?;
    }

    match error {
        Some(e) => Err(RunError::Request(e)),
        None => Ok(()),
    }
}

fn log_outcome(trace: &Trace) {
    let elapsed_ms = u64::try_from(trace.elapsed().as_millis()).unwrap_or(u64::MAX);

    match trace.response {
        Some(ref head) => tracing::info!(
            status = head.status.as_u16(),
            retries = trace.retries,
            elapsed_ms,
            body_bytes = trace.response_body.len(),
            "{} {} completed",
            trace.request.method,
            trace.request.url
        ),
        None => tracing::info!(
            retries = trace.retries,
            elapsed_ms,
            "{} {} received no response",
            trace.request.method,
            trace.request.url
        ),
    }
}

/// Renders a trace in the requested format.
///
/// `Raw` writes the dumps byte for byte; the other formats are valid UTF-8
/// with non-text bodies replaced by `placeholder`.
fn render(trace: &Trace, format: OutputFormat, placeholder: &str) -> Result<Vec<u8>, RunError> {
    match format {
        OutputFormat::Raw => {
            let mut out = Vec::with_capacity(
                trace.request_trace.len()
                    + trace.response_trace.len()
                    + trace.response_body.len()
                    + 2,
            );
            out.extend_from_slice(&trace.request_trace);
            out.push(b'\n');
            out.extend_from_slice(&trace.response_trace);
            out.extend_from_slice(&trace.response_body);
            out.push(b'\n');
            Ok(out)
        }
        OutputFormat::Sanitized => {
            let mut text = trace.sanitized_request(placeholder);
            text.push('\n');
            if trace.response.is_some() {
                text.push_str(&trace.sanitized_response(placeholder));
                text.push('\n');
            }
            Ok(text.into_bytes())
        }
        OutputFormat::Json => {
            let mut json =
                serde_json::to_vec_pretty(&trace.summary(placeholder)).map_err(RunError::Render)?;
            json.push(b'\n');
            Ok(json)
        }
    }
}
