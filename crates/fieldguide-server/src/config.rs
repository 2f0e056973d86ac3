//! Server configuration, loaded from the environment.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ServerError, ServerResult};

/// Fallback signing secret for local development only.
const DEV_JWT_SECRET: &str = "your-super-secret-key-change-in-production";

/// Runtime configuration for the knowledge-base server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the HTTP listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Knowledge store backend: `memory://<name>` or `file://<data dir>`.
    #[serde(default = "default_store_url")]
    pub store_url: String,

    /// Search backend: `memory://<name>` or the `http(s)://` base URL of a
    /// Meilisearch instance.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// API key sent to the search backend. Optional for unsecured instances.
    #[serde(default)]
    pub search_api_key: Option<String>,

    /// HMAC secret for signing access tokens. Must be at least 32 bytes.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Access token lifetime in hours.
    #[serde(default = "default_token_expiry_hours")]
    pub token_expiry_hours: i64,

    /// Directory uploaded files are written to and served from.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    /// Search endpoint rate limit: requests per window.
    #[serde(default = "default_search_rate_limit_max")]
    pub search_rate_limit_max: u32,

    /// Search endpoint rate limit: window length in milliseconds.
    #[serde(default = "default_search_rate_limit_window_ms")]
    pub search_rate_limit_window_ms: u64,

    /// Log level filter used when RUST_LOG is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_store_url() -> String {
    "file://data".to_string()
}

fn default_search_url() -> String {
    "http://localhost:7700".to_string()
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_expiry_hours() -> i64 {
    // Seven days, matching the issued-token lifetime clients expect.
    168
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

fn default_search_rate_limit_max() -> u32 {
    100
}

fn default_search_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            bind_address: default_bind_address(),
            store_url: default_store_url(),
            search_url: default_search_url(),
            search_api_key: None,
            jwt_secret: default_jwt_secret(),
            token_expiry_hours: default_token_expiry_hours(),
            uploads_dir: default_uploads_dir(),
            search_rate_limit_max: default_search_rate_limit_max(),
            search_rate_limit_window_ms: default_search_rate_limit_window_ms(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn load() -> ServerResult<Self> {
        let mut config = ServerConfig::default();

        if let Ok(port) = env::var("PORT") {
            match port.parse::<u16>() {
                Ok(value) => config.port = value,
                Err(_) => warn!("Invalid PORT value '{}', using {}", port, config.port),
            }
        }

        if let Ok(address) = env::var("BIND_ADDRESS") {
            config.bind_address = address;
        }

        if let Ok(url) = env::var("STORE_URL") {
            config.store_url = url;
        }

        if let Ok(url) = env::var("SEARCH_URL") {
            config.search_url = url;
        }

        if let Ok(key) = env::var("SEARCH_API_KEY") {
            if !key.is_empty() {
                config.search_api_key = Some(key);
            }
        }

        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => warn!("JWT_SECRET not set, using the built-in development secret"),
        }

        if let Ok(hours) = env::var("TOKEN_EXPIRY_HOURS") {
            match hours.parse::<i64>() {
                Ok(value) if value > 0 => config.token_expiry_hours = value,
                _ => warn!(
                    "Invalid TOKEN_EXPIRY_HOURS value '{}', using {}",
                    hours, config.token_expiry_hours
                ),
            }
        }

        if let Ok(dir) = env::var("UPLOADS_DIR") {
            config.uploads_dir = dir;
        }

        if let Ok(max) = env::var("SEARCH_RATE_LIMIT_MAX") {
            match max.parse::<u32>() {
                Ok(value) if value > 0 => config.search_rate_limit_max = value,
                _ => warn!(
                    "Invalid SEARCH_RATE_LIMIT_MAX value '{}', using {}",
                    max, config.search_rate_limit_max
                ),
            }
        }

        if let Ok(window) = env::var("SEARCH_RATE_LIMIT_WINDOW_MS") {
            match window.parse::<u64>() {
                Ok(value) if value > 0 => config.search_rate_limit_window_ms = value,
                _ => warn!(
                    "Invalid SEARCH_RATE_LIMIT_WINDOW_MS value '{}', using {}",
                    window, config.search_rate_limit_window_ms
                ),
            }
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that would otherwise surface as confusing runtime
    /// failures.
    pub fn validate(&self) -> ServerResult<()> {
        if !self.store_url.contains("://") {
            return Err(ServerError::ConfigurationError(format!(
                "Invalid store URL: {}",
                self.store_url
            )));
        }
        if !self.search_url.contains("://") {
            return Err(ServerError::ConfigurationError(format!(
                "Invalid search URL: {}",
                self.search_url
            )));
        }
        if self.jwt_secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }
        if self.uploads_dir.is_empty() {
            return Err(ServerError::ConfigurationError(
                "Uploads directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_expiry_hours, 168);
    }

    #[test]
    fn short_secret_is_rejected() {
        let config = ServerConfig {
            jwt_secret: "short".to_string(),
            ..ServerConfig::default()
        };
        match config.validate() {
            Err(ServerError::ConfigurationError(_)) => (),
            other => panic!("Expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn schemeless_store_url_is_rejected() {
        let config = ServerConfig {
            store_url: "/var/data".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
