//! Tag and category endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use fieldguide_store::{Category, Tag};

use crate::server::KnowledgeServer;

use super::auth::AdminUser;
use super::errors::api_error_response;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTagRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagResponse {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Tag> for TagResponse {
    fn from(tag: &Tag) -> Self {
        TagResponse {
            name: tag.name.clone(),
            created_at: tag.created_at,
        }
    }
}

/// Tag plus the number of articles currently carrying it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagWithCount {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        CategoryResponse {
            id: category.id,
            name: category.name,
            slug: category.slug,
            created_at: category.created_at,
        }
    }
}

pub async fn create_tag_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
    Json(req): Json<CreateTagRequest>,
) -> impl IntoResponse {
    match server.create_tag(&req.name).await {
        Ok(tag) => (StatusCode::CREATED, Json(tag)).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn list_tags_handler(State(server): State<Arc<KnowledgeServer>>) -> impl IntoResponse {
    match server.list_tags().await {
        Ok(tags) => Json(tags).into_response(),
        Err(err) => {
            error!(?err, "Failed to list tags");
            api_error_response(&err)
        }
    }
}

pub async fn create_category_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
    Json(req): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    match server.create_category(&req.name, &req.slug).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn list_categories_handler(
    State(server): State<Arc<KnowledgeServer>>,
) -> impl IntoResponse {
    match server.list_categories().await {
        Ok(categories) => Json(categories).into_response(),
        Err(err) => {
            error!(?err, "Failed to list categories");
            api_error_response(&err)
        }
    }
}
