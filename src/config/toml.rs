//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Request configuration section
    #[serde(default)]
    pub request: RequestSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// Access policy configuration
    #[serde(default)]
    pub access: AccessSection,

    /// Trace capture and output configuration
    #[serde(default)]
    pub trace: TraceSection,
}

/// Request configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSection {
    /// Target URL
    pub url: Option<String>,

    /// HTTP method (default: GET, or POST with a body)
    pub method: Option<String>,

    /// HTTP headers as key-value pairs
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Bearer token for Authorization header
    pub bearer: Option<String>,

    /// Basic authentication credentials
    pub basic_auth: Option<BasicAuthSection>,

    /// Request body as text
    pub body: Option<String>,

    /// Path to a file holding the request body
    pub body_file: Option<String>,

    /// Per-attempt timeout in seconds
    pub timeout: Option<u64>,
}

/// Basic authentication credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthSection {
    /// User name
    pub username: String,

    /// Password
    #[serde(default)]
    pub password: String,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of retries after the first attempt
    pub max_retries: Option<u32>,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,
}

/// Access policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessSection {
    /// Deny loopback, private, link-local and other internal networks
    #[serde(default)]
    pub block_private: bool,

    /// Regex patterns for host names to deny
    #[serde(default)]
    pub deny_hosts: Vec<String>,

    /// Networks in CIDR notation to deny
    #[serde(default)]
    pub deny_networks: Vec<String>,
}

/// Trace capture and output configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceSection {
    /// Maximum response body size to capture in bytes (0 = unlimited)
    pub max_body_bytes: Option<usize>,

    /// Text shown in place of a body that is not valid UTF-8
    pub placeholder: Option<String>,

    /// Output format: "raw", "sanitized" or "json"
    pub output: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# httpx-exec Configuration File

[request]
# Target URL (required unless passed with --url)
# url = "https://api.example.com/hook"

# HTTP method (default: GET, or POST when a body is set)
# method = "POST"

# Request body, inline or from a file (not both)
# body = '{"event": "ping"}'
# body_file = "payload.json"

# Per-attempt timeout in seconds (default: 30)
# timeout = 30

# Bearer token for Authorization header
# bearer = "your-token-here"

# Basic authentication (cannot be combined with bearer)
# [request.basic_auth]
# username = "user"
# password = "secret"

# HTTP headers
# [request.headers]
# Content-Type = "application/json"

[retry]
# Maximum number of retries after the first attempt (default: 3, 0 disables)
# max_retries = 3

# Initial retry delay in milliseconds (default: 500)
# initial_delay_ms = 500

# Maximum retry delay in milliseconds (default: 10000)
# max_delay_ms = 10000

# Backoff multiplier (default: 2.0)
# multiplier = 2.0

[access]
# Deny loopback, RFC 1918, link-local and other internal networks
# block_private = true

# Regex patterns for host names to deny
# Note: CLI patterns REPLACE these entirely (not merged)
# deny_hosts = ["(^|\\.)internal\\.example$"]

# Networks to deny in CIDR notation
# Note: CLI networks REPLACE these entirely (not merged)
# deny_networks = ["100.64.0.0/10"]

[trace]
# Maximum response body size to capture in bytes (default: 1048576, 0 = unlimited)
# max_body_bytes = 1048576

# Text shown in place of a body that is not valid UTF-8
# placeholder = "[binary body omitted]"

# Output format: "raw", "sanitized" or "json" (default: sanitized)
# output = "sanitized"
"#
    .to_string()
}
