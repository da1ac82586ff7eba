//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

/// Default HTTP method for requests without a body.
pub const METHOD: &str = "GET";

/// Default HTTP method for requests with a body.
pub const METHOD_WITH_BODY: &str = "POST";

/// Default per-attempt timeout in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// Default maximum number of retries after the first attempt.
pub const RETRY_MAX_RETRIES: u32 = 3;

/// Default initial retry delay in milliseconds.
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;

/// Default maximum retry delay in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 10_000;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Default response body capture limit in bytes (1 MiB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default text shown in place of a non-UTF-8 body.
pub const PLACEHOLDER: &str = "[binary body omitted]";
