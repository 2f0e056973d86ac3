//! Q&A article endpoints: CRUD, workflow transitions, and revision history.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use fieldguide_store::{ArticleFilter, ArticleKind, ArticleStatus, Role};

pub use crate::articles::ArticleSnapshot;

use crate::server::KnowledgeServer;

use super::auth::{AdminUser, AuthUser, OptionalAuthUser};
use super::errors::{api_error_response, message_response};
use super::metadata::CategoryResponse;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content_markdown: String,
    #[serde(rename = "type")]
    pub kind: Option<ArticleKind>,
    pub category_id: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content_markdown: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ArticleKind>,
    pub category_id: Option<String>,
    pub status: Option<ArticleStatus>,
    pub tags: Option<Vec<String>>,
}

/// Article as served to clients. The author is embedded without the
/// password hash, the category is resolved from its id.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content_markdown: String,
    pub content_text: String,
    #[serde(rename = "type")]
    pub kind: ArticleKind,
    pub status: ArticleStatus,
    pub author_id: String,
    pub author: Option<AuthorRef>,
    pub category_id: Option<String>,
    pub category: Option<CategoryResponse>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub id: String,
    pub article_id: String,
    pub changed_by: Option<AuthorRef>,
    pub old_content: ArticleSnapshot,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListParams {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub author_id: Option<String>,
}

pub async fn create_article_handler(
    State(server): State<Arc<KnowledgeServer>>,
    user: AuthUser,
    Json(req): Json<CreateArticleRequest>,
) -> impl IntoResponse {
    match server.create_article(req, &user.id).await {
        Ok(article) => (StatusCode::CREATED, Json(article)).into_response(),
        Err(err) => {
            if !err.is_client_error() {
                error!(?err, "Failed to create article");
            }
            api_error_response(&err)
        }
    }
}

pub async fn list_articles_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Query(params): Query<ArticleListParams>,
) -> Response {
    let mut filter = ArticleFilter::default();
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        match status.parse() {
            Ok(status) => filter.status = Some(status),
            Err(_) => return message_response(StatusCode::BAD_REQUEST, "Invalid status filter"),
        }
    }
    if let Some(kind) = params.kind.as_deref().filter(|s| !s.is_empty()) {
        match kind.parse() {
            Ok(kind) => filter.kind = Some(kind),
            Err(_) => return message_response(StatusCode::BAD_REQUEST, "Invalid type filter"),
        }
    }
    filter.author_id = params.author_id.filter(|s| !s.is_empty());

    match server.list_articles(&filter).await {
        Ok(articles) => Json(articles).into_response(),
        Err(err) => {
            error!(?err, "Failed to list articles");
            api_error_response(&err)
        }
    }
}

pub async fn get_article_handler(
    State(server): State<Arc<KnowledgeServer>>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server.get_article(&id, viewer.as_ref()).await {
        Ok(article) => Json(article).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn update_article_handler(
    State(server): State<Arc<KnowledgeServer>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateArticleRequest>,
) -> impl IntoResponse {
    match server.update_article(&id, req, &user).await {
        Ok(article) => Json(article).into_response(),
        Err(err) => {
            if !err.is_client_error() {
                error!(?err, article_id = %id, "Failed to update article");
            }
            api_error_response(&err)
        }
    }
}

pub async fn delete_article_handler(
    State(server): State<Arc<KnowledgeServer>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server.delete_article(&id, &user).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn publish_article_handler(
    State(server): State<Arc<KnowledgeServer>>,
    AdminUser(user): AdminUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server
        .transition_article(&id, ArticleStatus::Published, &user)
        .await
    {
        Ok(article) => Json(article).into_response(),
        Err(err) => api_error_response(&err),
    }
}

/// Sends the article back to DRAFT. The optional `{reason}` body is
/// accepted but not persisted.
pub async fn reject_article_handler(
    State(server): State<Arc<KnowledgeServer>>,
    AdminUser(user): AdminUser,
    Path(id): Path<String>,
    _body: Option<Json<serde_json::Value>>,
) -> impl IntoResponse {
    match server
        .transition_article(&id, ArticleStatus::Draft, &user)
        .await
    {
        Ok(article) => Json(article).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn article_history_handler(
    State(server): State<Arc<KnowledgeServer>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server.article_history(&id, &user).await {
        Ok(history) => Json(history).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn restore_article_handler(
    State(server): State<Arc<KnowledgeServer>>,
    user: AuthUser,
    Path((id, history_id)): Path<(String, String)>,
) -> impl IntoResponse {
    match server.restore_article(&id, &history_id, &user).await {
        Ok(article) => Json(article).into_response(),
        Err(err) => {
            if !err.is_client_error() {
                error!(?err, article_id = %id, "Failed to restore article");
            }
            api_error_response(&err)
        }
    }
}
