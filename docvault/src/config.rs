//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `docvault.yaml` but can be specified via `-f` flag or `DOCVAULT_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `docvault.yaml`)
//! 2. **Environment variables** - Variables prefixed with `DOCVAULT_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database_url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `DOCVAULT_AUTH__JWT_EXPIRY=12h` sets the `auth.jwt_expiry` field.
//!
//! ```bash
//! # Override server port
//! DOCVAULT_PORT=8080
//!
//! # Set database connection
//! DATABASE_URL="sqlite:///var/lib/docvault/archive.db"
//!
//! # Override nested values
//! DOCVAULT_AUTH__PASSWORD__MIN_LENGTH=12
//! ```

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "DOCVAULT_CONFIG", default_value = "docvault.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Email address for the initial archivist account (created on first startup)
    pub archivist_email: String,
    /// Password for the initial archivist account (optional, can be set via environment)
    pub archivist_password: Option<String>,
    /// Secret key for JWT signing (required for production)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Resource limits for protecting system capacity
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Password complexity requirements for registration
    pub password: PasswordConfig,
    /// How long issued session tokens stay valid
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password: PasswordConfig::default(),
            jwt_expiry: Duration::from_secs(24 * 3600),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted size for an uploaded document file, in bytes
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: "sqlite://docvault.db?mode=rwc".to_string(),
            archivist_email: "archivist@example.com".to_string(),
            archivist_password: None,
            secret_key: None,
            auth: AuthConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        Self::figment(args).extract()
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("DOCVAULT_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                 Please set DOCVAULT_SECRET_KEY environment variable or add secret_key to config file."
                    .to_string(),
            });
        }

        if self.auth.password.min_length > self.auth.password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                    self.auth.password.min_length, self.auth.password.max_length
                ),
            });
        }

        if self.auth.password.min_length < 1 {
            return Err(Error::Internal {
                operation: "Config validation: Invalid password configuration: min_length must be at least 1".to_string(),
            });
        }

        if self.auth.jwt_expiry.as_secs() < 300 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.auth.jwt_expiry.as_secs() > 86400 * 30 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too long (maximum 30 days)".to_string(),
            });
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(Error::Internal {
                operation: "Config validation: max_upload_bytes must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
