//! Liveness and dependency health endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::server::KnowledgeServer;

/// Reports dependency health. The search index being down degrades the
/// report but does not fail it; an unreachable store does.
pub async fn health_check_handler(State(server): State<Arc<KnowledgeServer>>) -> impl IntoResponse {
    let store_up = server.store_healthy().await;
    let search_up = server.search_healthy().await;

    let status = if store_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if store_up { "ok" } else { "unavailable" },
        "timestamp": Utc::now().to_rfc3339(),
        "dependencies": {
            "store": if store_up { "UP" } else { "DOWN" },
            "searchIndex": if search_up { "UP" } else { "DOWN" },
        }
    });

    (status, Json(body))
}
