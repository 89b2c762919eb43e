//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 0.0.0.0)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    pub sentry: SentryConfig,
}

/// Sentry settings. A missing DSN disables Sentry.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = std::env::var("STOREFRONT_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))?;
        let host = get_env_or_default("STOREFRONT_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = std::env::var("STOREFRONT_BASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("STOREFRONT_BASE_URL".to_string()))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            sentry: SentryConfig {
                dsn: std::env::var("SENTRY_DSN").ok(),
                environment: std::env::var("SENTRY_ENVIRONMENT").ok(),
                sample_rate: parse_rate("SENTRY_SAMPLE_RATE", 1.0),
                traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1),
            },
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL for a site path.
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_rate(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|r| (0.0..=1.0).contains(r))
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr_and_absolute_url() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/tidemark"),
            host: "0.0.0.0".parse().unwrap(),
            port: 3000,
            base_url: "https://shop.tidemark.example".to_string(),
            sentry: SentryConfig {
                dsn: None,
                environment: None,
                sample_rate: 1.0,
                traces_sample_rate: 0.1,
            },
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(
            config.absolute_url("/product/linen-shirt/"),
            "https://shop.tidemark.example/product/linen-shirt/"
        );
        assert!(!format!("{config:?}").contains("postgres://localhost/tidemark"));
    }
}
