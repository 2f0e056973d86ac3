//! HTTP server for the knowledge base.
//!
//! Wires a persistent [`fieldguide_store`] backend and a
//! [`fieldguide_search`] index together behind one [`KnowledgeServer`] and
//! exposes them over the REST surface in [`api`].

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod server;
pub mod workflow;

mod analytics;
mod articles;
mod flows;
mod markdown;
mod metadata;
mod search;
mod uploads;
mod users;

use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use fieldguide_search::{InMemoryIndex, MeiliClient, SearchIndex};
use fieldguide_store::{FileStore, KnowledgeStore, MemoryStore};

pub use auth::AuthService;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::KnowledgeServer;

/// Runs the server until the process exits: initializes logging, builds
/// the configured backends, binds, and serves.
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    init_logging(&config.log_level);
    config.validate()?;

    let store = create_store(&config)?;
    let search = create_search_index(&config)?;
    let auth = AuthService::new(config.jwt_secret.clone(), config.token_expiry_hours)?;

    let server = KnowledgeServer::new(config, store, search, auth);
    server.run().await
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set.
fn init_logging(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Builds the store named by `store_url`: `memory://` for an ephemeral
/// in-process store, `file://<dir>` for JSON files under `<dir>`.
pub fn create_store(config: &ServerConfig) -> ServerResult<Arc<dyn KnowledgeStore>> {
    if config.store_url.starts_with("memory://") {
        Ok(Arc::new(MemoryStore::new()))
    } else if let Some(path) = config.store_url.strip_prefix("file://") {
        Ok(Arc::new(FileStore::new(path)?))
    } else {
        Err(ServerError::ConfigurationError(format!(
            "Unsupported store URL: {}",
            config.store_url
        )))
    }
}

/// Builds the search index named by `search_url`: `memory://` for the
/// in-process index, `http(s)://` for a Meilisearch instance.
pub fn create_search_index(config: &ServerConfig) -> ServerResult<Arc<dyn SearchIndex>> {
    if config.search_url.starts_with("memory://") {
        Ok(Arc::new(InMemoryIndex::new()))
    } else if config.search_url.starts_with("http://") || config.search_url.starts_with("https://")
    {
        if config.search_api_key.is_none() {
            warn!("SEARCH_API_KEY is not set, connecting to the search index without credentials");
        }
        Ok(Arc::new(MeiliClient::new(
            config.search_url.clone(),
            config.search_api_key.clone().unwrap_or_default(),
        )))
    } else {
        Err(ServerError::ConfigurationError(format!(
            "Unsupported search URL: {}",
            config.search_url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_urls(store_url: &str, search_url: &str) -> ServerConfig {
        ServerConfig {
            store_url: store_url.to_string(),
            search_url: search_url.to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn memory_store_url_is_supported() {
        let config = config_with_urls("memory://", "memory://");
        let store = create_store(&config).unwrap();
        assert!(store.as_any().downcast_ref::<MemoryStore>().is_some());
    }

    #[test]
    fn unknown_store_url_is_rejected() {
        let config = config_with_urls("redis://localhost", "memory://");
        assert!(matches!(
            create_store(&config),
            Err(ServerError::ConfigurationError(_))
        ));
    }

    #[test]
    fn http_search_url_builds_a_remote_client() {
        let config = config_with_urls("memory://", "http://localhost:7700");
        let index = create_search_index(&config).unwrap();
        assert!(index.as_any().downcast_ref::<MeiliClient>().is_some());
    }

    #[test]
    fn unknown_search_url_is_rejected() {
        let config = config_with_urls("memory://", "ftp://index");
        assert!(matches!(
            create_search_index(&config),
            Err(ServerError::ConfigurationError(_))
        ));
    }
}
