//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;

use crate::outbound::{
    ExponentialBackoff, HttpRequest, IpNetwork, NetworkAccessPolicy, basic_auth,
};

use super::cli::{Cli, OutputFormat};
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// The request to execute, headers and body resolved
    pub request: HttpRequest,

    /// Per-attempt timeout applied by the transport
    pub timeout: Duration,

    /// Retry policy for failed attempts
    pub retry_policy: ExponentialBackoff,

    /// Pre-dispatch access policy
    pub access_policy: NetworkAccessPolicy,

    /// Response body capture limit (0 = unlimited)
    pub max_body_bytes: usize,

    /// Text shown in place of a non-UTF-8 body
    pub placeholder: String,

    /// Output format for the captured trace
    pub output: OutputFormat,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ method: {}, url: {}, timeout: {}s, retry: {}x/{}ms, \
             denied networks: {}, denied hosts: {}, max_body_bytes: {}, output: {} }}",
            self.request.method,
            self.request.url,
            self.timeout.as_secs(),
            self.retry_policy.max_retries,
            self.retry_policy.initial_delay.as_millis(),
            self.access_policy.networks().len(),
            self.access_policy.host_pattern_count(),
            self.max_body_bytes,
            self.output,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL is missing or invalid
    /// - The method or a header is invalid
    /// - Both inline and file bodies, or both bearer and basic auth, are configured
    /// - The body file cannot be read
    /// - Regex patterns or networks are invalid
    /// - Timeout or retry values are out of range
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let url = Self::resolve_url(cli, toml)?;
        let body = Self::resolve_body(cli, toml)?;
        let method = Self::resolve_method(cli, toml, body.is_some());
        let headers = Self::resolve_headers(cli, toml)?;

        let request = HttpRequest::build(
            method,
            url,
            body,
            headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )?;

        let timeout = Self::resolve_timeout(cli, toml)?;
        let retry_policy = Self::build_retry_policy(cli, toml)?;
        let access_policy = Self::build_access_policy(cli, toml)?;

        let trace = toml.map(|t| &t.trace);

        let max_body_bytes = cli
            .max_body_bytes
            .or_else(|| trace.and_then(|t| t.max_body_bytes))
            .unwrap_or(defaults::MAX_BODY_BYTES);

        let placeholder = cli
            .placeholder
            .clone()
            .or_else(|| trace.and_then(|t| t.placeholder.clone()))
            .unwrap_or_else(|| defaults::PLACEHOLDER.to_string());

        let output = match (cli.output, trace.and_then(|t| t.output.as_deref())) {
            (Some(output), _) => output,
            (None, Some(value)) => parse_output_format(value)?,
            (None, None) => OutputFormat::default(),
        };

        Ok(Self {
            request,
            timeout,
            retry_policy,
            access_policy,
            max_body_bytes,
            placeholder,
            output,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_url<'a>(cli: &'a Cli, toml: Option<&'a TomlConfig>) -> Result<&'a str, ConfigError> {
        cli.url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.request.url.as_deref()))
            .ok_or_else(|| {
                ConfigError::missing(field::URL, "Use --url or set request.url in config file")
            })
    }

    fn resolve_method<'a>(cli: &'a Cli, toml: Option<&'a TomlConfig>, has_body: bool) -> &'a str {
        // Priority: CLI explicit > TOML > default for the body kind
        cli.method
            .as_deref()
            .or_else(|| toml.and_then(|t| t.request.method.as_deref()))
            .unwrap_or(if has_body {
                defaults::METHOD_WITH_BODY
            } else {
                defaults::METHOD
            })
    }

    fn resolve_body(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Option<Vec<u8>>, ConfigError> {
        // A CLI body of either kind replaces any TOML body
        if let Some(ref text) = cli.body {
            return Ok(Some(text.clone().into_bytes()));
        }
        if let Some(ref path) = cli.body_file {
            return read_body_file(path).map(Some);
        }

        let Some(request) = toml.map(|t| &t.request) else {
            return Ok(None);
        };

        match (&request.body, &request.body_file) {
            (Some(_), Some(_)) => Err(ConfigError::Conflict(
                "request.body and request.body_file are mutually exclusive",
            )),
            (Some(text), None) => Ok(Some(text.clone().into_bytes())),
            (None, Some(path)) => read_body_file(Path::new(path)).map(Some),
            (None, None) => Ok(None),
        }
    }

    /// Returns header pairs in application order; later pairs replace earlier
    /// ones with the same name.
    fn resolve_headers(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Vec<(String, String)>, ConfigError> {
        let mut headers = Vec::new();

        // TOML headers first (CLI can override)
        if let Some(toml) = toml {
            for (name, value) in &toml.request.headers {
                headers.push((name.clone(), value.clone()));
            }
        }

        for header_str in &cli.headers {
            headers.push(parse_header_string(header_str)?);
        }

        if let Some(value) = Self::resolve_authorization(cli, toml)? {
            headers.push(("Authorization".to_string(), value));
        }

        Ok(headers)
    }

    fn resolve_authorization(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Option<String>, ConfigError> {
        // CLI credentials of either kind replace TOML credentials
        if let Some(ref token) = cli.bearer {
            return Ok(Some(format!("Bearer {token}")));
        }
        if let Some(ref credentials) = cli.basic {
            let (username, password) = credentials
                .split_once(':')
                .ok_or(ConfigError::InvalidBasicAuth)?;
            return Ok(Some(format!("Basic {}", basic_auth(username, password))));
        }

        let Some(request) = toml.map(|t| &t.request) else {
            return Ok(None);
        };

        match (&request.bearer, &request.basic_auth) {
            (Some(_), Some(_)) => Err(ConfigError::Conflict(
                "request.bearer and request.basic_auth are mutually exclusive",
            )),
            (Some(token), None) => Ok(Some(format!("Bearer {token}"))),
            (None, Some(auth)) => Ok(Some(format!(
                "Basic {}",
                basic_auth(&auth.username, &auth.password)
            ))),
            (None, None) => Ok(None),
        }
    }

    fn resolve_timeout(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let seconds = cli
            .timeout
            .or_else(|| toml.and_then(|t| t.request.timeout))
            .unwrap_or(defaults::TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<ExponentialBackoff, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default
        let max_retries = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_retries))
            .unwrap_or(defaults::RETRY_MAX_RETRIES);

        let initial_delay_ms = cli
            .retry_delay_ms
            .or_else(|| retry.and_then(|r| r.initial_delay_ms))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_MS);

        let max_delay_ms = retry
            .and_then(|r| r.max_delay_ms)
            .unwrap_or(defaults::RETRY_MAX_DELAY_MS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_delay_ms < initial_delay_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_ms ({max_delay_ms}) must be >= initial_delay_ms ({initial_delay_ms})"
            )));
        }

        Ok(ExponentialBackoff::new()
            .with_max_retries(max_retries)
            .with_initial_delay(Duration::from_millis(initial_delay_ms))
            .with_max_delay(Duration::from_millis(max_delay_ms))
            .with_multiplier(multiplier))
    }

    fn build_access_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<NetworkAccessPolicy, ConfigError> {
        let access = toml.map(|t| &t.access);

        // Flags only enable
        let block_private = cli.block_private || access.is_some_and(|a| a.block_private);

        let mut policy = if block_private {
            NetworkAccessPolicy::private()
        } else {
            NetworkAccessPolicy::new()
        };

        // CLI lists replace TOML lists entirely
        let networks = if cli.deny_networks.is_empty() {
            access.map_or(&[][..], |a| a.deny_networks.as_slice())
        } else {
            cli.deny_networks.as_slice()
        };
        for network in networks {
            policy = policy.with_network(network.parse::<IpNetwork>()?);
        }

        let patterns = if cli.deny_hosts.is_empty() {
            access.map_or(&[][..], |a| a.deny_hosts.as_slice())
        } else {
            cli.deny_hosts.as_slice()
        };
        for pattern in patterns {
            let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                pattern: pattern.clone(),
                source: e,
            })?;
            policy = policy.with_host_pattern(regex);
        }

        Ok(policy)
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn read_body_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|e| ConfigError::BodyRead {
        path: PathBuf::from(path),
        source: e,
    })
}

fn parse_output_format(s: &str) -> Result<OutputFormat, ConfigError> {
    match s.to_lowercase().as_str() {
        "raw" => Ok(OutputFormat::Raw),
        "sanitized" | "text" => Ok(OutputFormat::Sanitized),
        "json" => Ok(OutputFormat::Json),
        _ => Err(ConfigError::InvalidOutput {
            value: s.to_string(),
        }),
    }
}

/// Splits "Key=Value" or "Key: Value" at whichever separator comes first, so
/// values may contain the other one.
fn parse_header_string(s: &str) -> Result<(String, String), ConfigError> {
    let pos = s.find(['=', ':']).ok_or_else(|| ConfigError::InvalidHeader {
        value: s.to_string(),
    })?;

    let name = s[..pos].trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidHeader {
            value: s.to_string(),
        });
    }

    Ok((name.to_string(), s[pos + 1..].trim().to_string()))
}
