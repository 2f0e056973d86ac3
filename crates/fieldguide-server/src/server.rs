//! Core server type wiring the store, search index, and auth together.
//!
//! `KnowledgeServer` owns the injected collaborators and exposes every
//! domain operation as a method; the `api` module maps HTTP onto those
//! methods. Operations are grouped into sibling modules (`articles`,
//! `flows`, `users`, ...) as separate `impl` blocks.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use fieldguide_search::SearchIndex;
use fieldguide_store::KnowledgeStore;

use crate::api;
use crate::auth::AuthService;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::rate_limit::{RateLimiter, RateLimiterConfig};

/// The knowledge-base application server.
pub struct KnowledgeServer {
    pub(crate) config: ServerConfig,
    pub(crate) store: Arc<dyn KnowledgeStore>,
    pub(crate) search: Arc<dyn SearchIndex>,
    pub(crate) auth: AuthService,
    pub(crate) search_limiter: RateLimiter,
}

impl KnowledgeServer {
    /// Creates a server instance from its collaborators.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn KnowledgeStore>,
        search: Arc<dyn SearchIndex>,
        auth: AuthService,
    ) -> Self {
        let search_limiter = RateLimiter::new(RateLimiterConfig {
            max_requests: config.search_rate_limit_max,
            window_ms: config.search_rate_limit_window_ms,
        });

        KnowledgeServer {
            config,
            store,
            search,
            auth,
            search_limiter,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Binds the listener and serves requests until the process exits.
    pub async fn run(self) -> ServerResult<()> {
        let ip: IpAddr = self.config.bind_address.parse().map_err(|_| {
            ServerError::ConfigurationError(format!(
                "Invalid bind address: {}",
                self.config.bind_address
            ))
        })?;
        let addr = SocketAddr::new(ip, self.config.port);

        tokio::fs::create_dir_all(&self.config.uploads_dir).await?;
        self.bootstrap_search_index().await;

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Knowledge-base server listening on {}", local_addr);

        let app = api::build_router(Arc::new(self));
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// True when the store answers a trivial query.
    pub async fn store_healthy(&self) -> bool {
        self.store.count_users().await.is_ok()
    }

    /// True when the search backend reports itself available.
    pub async fn search_healthy(&self) -> bool {
        matches!(self.search.health_check().await, Ok(true))
    }
}

impl fmt::Debug for KnowledgeServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeServer")
            .field("config", &self.config)
            .field("search_limiter", &self.search_limiter)
            .finish_non_exhaustive()
    }
}
