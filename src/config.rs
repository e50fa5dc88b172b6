//! Type-safe configuration with validation
//!
//! Loads from environment variables with sane defaults for local runs.
//! Backend URLs and service credentials are supplied by the deployment
//! environment; validation rejects obviously broken values at startup.

use serde::Deserialize;
use std::env;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Name of the offending field
        field: String,
        /// Parse failure detail
        reason: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid timeout value
    #[error("Invalid timeout for {0}: must be greater than 0")]
    InvalidTimeout(String),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parse failure detail
        reason: String,
    },
}

/// Service configuration with validation.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// Backend base URL (GoTrue + PostgREST live under it)
    pub backend_url: Url,
    /// Service-role key for privileged backend lookups
    pub service_role_key: String,
    /// Anonymous key used when constructing caller-scoped clients
    pub anon_key: String,
    /// Upstream HTTP request timeout in seconds (must be > 0)
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
    /// Rate-limiter sweep interval in seconds (must be > 0)
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8787)?,
            backend_url: parse_url_env("SUPABASE_URL", "http://localhost:54321")?,
            service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .map_err(|_| ConfigError::MissingRequired("SUPABASE_SERVICE_ROLE_KEY".into()))?,
            anon_key: env::var("SUPABASE_ANON_KEY")
                .map_err(|_| ConfigError::MissingRequired("SUPABASE_ANON_KEY".into()))?,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT", 10)?,
            shutdown_timeout_secs: parse_env("SHUTDOWN_TIMEOUT", 30)?,
            sweep_interval_secs: parse_env("SWEEP_INTERVAL", 60)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("REQUEST_TIMEOUT".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidTimeout("SWEEP_INTERVAL".into()));
        }
        if self.service_role_key.is_empty() {
            return Err(ConfigError::MissingRequired(
                "SUPABASE_SERVICE_ROLE_KEY".into(),
            ));
        }
        if self.anon_key.is_empty() {
            return Err(ConfigError::MissingRequired("SUPABASE_ANON_KEY".into()));
        }
        Ok(())
    }

    /// Gets the backend base URL as a string.
    #[must_use]
    pub fn backend_url_str(&self) -> &str {
        self.backend_url.as_str()
    }
}

/// Parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a URL environment variable with a default value.
fn parse_url_env(name: &str, default: &str) -> Result<Url, ConfigError> {
    let url_str = env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}
