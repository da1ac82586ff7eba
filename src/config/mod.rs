//! Configuration layer for httpx-exec.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The URL has no default and must come from the CLI or the config file.
//!
//! Headers are merged: TOML headers are applied first and a CLI header with
//! the same name replaces the TOML value. Credentials and bodies are not
//! merged: a CLI `--bearer`/`--basic` replaces any TOML credentials, and a CLI
//! `--body`/`--body-file` replaces any TOML body.
//!
//! For deny lists (`deny_hosts`, `deny_networks`), CLI values **replace**
//! TOML values entirely (not merged). Each list is handled independently.
//!
//! # Boolean Flag Semantics
//!
//! `--block-private` uses OR semantics: if set `true` in either CLI or TOML,
//! the result is `true`. Flags only enable, never disable.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Some retry policy options are TOML-only (not available via CLI):
//! - `retry.max_delay_ms` (default: 10000) - Maximum retry delay
//! - `retry.multiplier` (default: 2.0) - Exponential backoff multiplier

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::{Cli, Command, OutputFormat};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
