//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// httpx-exec: traced HTTP request runner
///
/// Sends one HTTP request with retries and an optional network access
/// policy, then prints the captured exchange.
#[derive(Debug, Parser)]
#[command(name = "httpx-exec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Target URL (required unless set in the config file)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// HTTP method (default: GET, or POST when a body is given)
    #[arg(long, short = 'X')]
    pub method: Option<String>,

    /// HTTP headers in 'Key=Value' or 'Key: Value' format (can be specified multiple times)
    #[arg(long = "header", short = 'H', value_name = "K=V")]
    pub headers: Vec<String>,

    /// Request body as text
    #[arg(long, short = 'd', conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the request body from a file
    #[arg(long = "body-file", value_name = "PATH")]
    pub body_file: Option<PathBuf>,

    /// Bearer token for Authorization header
    #[arg(long, conflicts_with = "basic")]
    pub bearer: Option<String>,

    /// Basic authentication credentials
    #[arg(long, value_name = "USER:PASS")]
    pub basic: Option<String>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum number of retries after the first attempt
    #[arg(long = "retry-max")]
    pub retry_max: Option<u32>,

    /// Initial retry delay in milliseconds
    #[arg(long = "retry-delay-ms")]
    pub retry_delay_ms: Option<u64>,

    /// Deny loopback, private, link-local and other internal networks
    #[arg(long = "block-private")]
    pub block_private: bool,

    /// Regex for host names to deny (can be specified multiple times)
    #[arg(long = "deny-host", value_name = "PATTERN")]
    pub deny_hosts: Vec<String>,

    /// Network in CIDR notation to deny (can be specified multiple times)
    #[arg(long = "deny-network", value_name = "CIDR")]
    pub deny_networks: Vec<String>,

    /// Maximum response body size to capture in bytes (0 = unlimited)
    #[arg(long = "max-body-bytes")]
    pub max_body_bytes: Option<usize>,

    /// Text shown in place of a body that is not valid UTF-8
    #[arg(long)]
    pub placeholder: Option<String>,

    /// Output format for the captured trace
    #[arg(long, short, value_enum)]
    pub output: Option<OutputFormat>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for httpx-exec
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "httpx-exec.toml")]
        output: PathBuf,
    },
}

/// How the captured trace is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Raw wire dump, body bytes included as-is
    #[value(name = "raw")]
    Raw,
    /// Valid UTF-8 dump with binary bodies replaced by the placeholder
    #[default]
    #[value(name = "sanitized")]
    Sanitized,
    /// JSON summary with sanitized dumps
    #[value(name = "json")]
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Raw => "raw",
            Self::Sanitized => "sanitized",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Parses CLI arguments from an iterator, returning clap's error instead
    /// of exiting.
    ///
    /// # Errors
    ///
    /// Returns a [`clap::Error`] for unknown or conflicting arguments.
    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
