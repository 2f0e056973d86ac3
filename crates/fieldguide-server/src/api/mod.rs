//! HTTP surface: route table, handlers, and the error-to-response mapping.

pub mod analytics;
pub mod articles;
pub mod auth;
pub mod errors;
pub mod flows;
pub mod health;
pub mod metadata;
pub mod search;
pub mod uploads;
pub mod users;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::server::KnowledgeServer;

/// Builds the complete application router. Uploaded files are served
/// statically from the configured uploads directory.
pub fn build_router(server: Arc<KnowledgeServer>) -> Router {
    let uploads_dir = server.config.uploads_dir.clone();

    Router::new()
        .route("/health", get(health::health_check_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/me", get(auth::me_handler))
        .route(
            "/api/qa",
            post(articles::create_article_handler).get(articles::list_articles_handler),
        )
        .route(
            "/api/qa/:id",
            get(articles::get_article_handler)
                .put(articles::update_article_handler)
                .delete(articles::delete_article_handler),
        )
        .route("/api/qa/:id/publish", post(articles::publish_article_handler))
        .route("/api/qa/:id/reject", post(articles::reject_article_handler))
        .route("/api/qa/:id/history", get(articles::article_history_handler))
        .route(
            "/api/qa/:id/history/:history_id/restore",
            post(articles::restore_article_handler),
        )
        .route(
            "/api/tags",
            post(metadata::create_tag_handler).get(metadata::list_tags_handler),
        )
        .route(
            "/api/categories",
            post(metadata::create_category_handler).get(metadata::list_categories_handler),
        )
        .route("/api/search", get(search::search_handler))
        .route(
            "/api/analytics/view/:id",
            post(analytics::track_view_handler).get(analytics::view_stats_handler),
        )
        .route(
            "/api/analytics/popular",
            get(analytics::popular_articles_handler),
        )
        .route("/api/analytics/stats", get(analytics::global_stats_handler))
        .route(
            "/api/diagnosis-flows",
            post(flows::create_flow_handler).get(flows::list_flows_handler),
        )
        .route(
            "/api/diagnosis-flows/:id",
            get(flows::get_flow_handler)
                .put(flows::update_flow_handler)
                .delete(flows::delete_flow_handler),
        )
        .route(
            "/api/diagnosis-flows/:id/node/:node_id",
            get(flows::resolve_node_handler),
        )
        .route(
            "/api/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route(
            "/api/users/:id",
            axum::routing::put(users::update_user_handler).delete(users::delete_user_handler),
        )
        .route("/api/upload", post(uploads::upload_handler))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(server)
}
