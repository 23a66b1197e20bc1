//! Command-line interface parsing for the Pokedex CLI
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated `StartupConfig`: cache lifetime, request timeout, API root and
//! save file location.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use thiserror::Error;

use crate::data::POKEAPI_BASE_URL;
use crate::storage::PokedexStore;

/// Default cache entry lifetime in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 120;

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The cache lifetime was zero
    #[error("Invalid cache TTL: must be at least 1 second")]
    ZeroCacheTtl,

    /// The cache lifetime is beyond what the system clock can represent
    #[error("Invalid cache TTL: {0} seconds is too long")]
    CacheTtlTooLong(u64),

    /// The request timeout was zero
    #[error("Invalid timeout: must be at least 1 second")]
    ZeroTimeout,

    /// The API root is not an http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidBaseUrl(String),
}

/// Pokedex CLI - explore PokeAPI and catch Pokemon from the terminal
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Explore PokeAPI location areas and catch Pokemon from the terminal")]
#[command(version)]
pub struct Cli {
    /// How long API responses stay cached, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl: u64,

    /// Where to save caught Pokemon (default: ~/.pokedex.json)
    #[arg(long, value_name = "PATH")]
    pub save_path: Option<PathBuf>,

    /// Root URL of the PokeAPI v2 service
    #[arg(long, value_name = "URL", default_value = POKEAPI_BASE_URL)]
    pub base_url: String,

    /// HTTP request timeout, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Log cache and request activity to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Lifetime of cached API responses
    pub cache_ttl: Duration,
    /// Timeout for each HTTP request
    pub request_timeout: Duration,
    /// PokeAPI root URL
    pub base_url: String,
    /// Pokedex save file
    pub save_path: PathBuf,
    /// Whether debug logging is enabled
    pub verbose: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: POKEAPI_BASE_URL.to_string(),
            save_path: PokedexStore::default_path(),
            verbose: false,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if a duration is zero, the cache TTL cannot be
    ///   represented on the clock, or the base URL is not http(s)
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.cache_ttl == 0 {
            return Err(CliError::ZeroCacheTtl);
        }
        let cache_ttl = Duration::from_secs(cli.cache_ttl);
        if Instant::now().checked_add(cache_ttl).is_none() {
            return Err(CliError::CacheTtlTooLong(cli.cache_ttl));
        }
        if cli.timeout == 0 {
            return Err(CliError::ZeroTimeout);
        }
        if !(cli.base_url.starts_with("http://") || cli.base_url.starts_with("https://")) {
            return Err(CliError::InvalidBaseUrl(cli.base_url.clone()));
        }

        Ok(StartupConfig {
            cache_ttl,
            request_timeout: Duration::from_secs(cli.timeout),
            base_url: cli.base_url.clone(),
            save_path: cli
                .save_path
                .clone()
                .unwrap_or_else(PokedexStore::default_path),
            verbose: cli.verbose,
        })
    }
}
