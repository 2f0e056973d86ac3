//! View-count tracking and aggregate statistics endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use fieldguide_store::ArticleKind;

use crate::server::KnowledgeServer;

use super::errors::api_error_response;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularEntry {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub view_count: u64,
    #[serde(rename = "type")]
    pub kind: ArticleKind,
    pub category: Option<CategoryBrief>,
    pub author: Option<AuthorBrief>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryBrief {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorBrief {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStats {
    pub total_views: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GlobalStats {
    pub articles: u64,
    pub users: u64,
    pub views: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct PopularParams {
    pub limit: Option<String>,
}

pub async fn track_view_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server.track_view(&id).await {
        Ok(_) => Json(json!({ "success": true })).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn view_stats_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server.view_stats(&id).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn popular_articles_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Query(params): Query<PopularParams>,
) -> impl IntoResponse {
    let limit = params
        .limit
        .as_deref()
        .and_then(|value| value.parse::<usize>().ok())
        .map(|value| value.max(1))
        .unwrap_or(10);

    match server.popular_articles(limit).await {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => {
            error!(?err, "Failed to list popular articles");
            api_error_response(&err)
        }
    }
}

pub async fn global_stats_handler(
    State(server): State<Arc<KnowledgeServer>>,
) -> impl IntoResponse {
    match server.global_stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => {
            error!(?err, "Failed to compute stats");
            api_error_response(&err)
        }
    }
}
