//! Admin-only user management endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use fieldguide_store::Role;

use crate::server::KnowledgeServer;

use super::auth::AdminUser;
use super::errors::{api_error_response, message_response};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub password: Option<String>,
}

pub async fn list_users_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
) -> impl IntoResponse {
    match server.list_users().await {
        Ok(users) => Json(users).into_response(),
        Err(err) => {
            error!(?err, "Failed to list users");
            api_error_response(&err)
        }
    }
}

pub async fn create_user_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
    Json(req): Json<CreateUserRequest>,
) -> Response {
    let Ok(role) = req.role.parse::<Role>() else {
        return message_response(StatusCode::BAD_REQUEST, "Invalid role");
    };
    match server.create_user(&req.email, &req.password, role).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn update_user_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Response {
    let role = match req.role.as_deref() {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => return message_response(StatusCode::BAD_REQUEST, "Invalid role"),
        },
        None => None,
    };
    match server.update_user(&id, role, req.password.as_deref()).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn delete_user_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server.delete_user(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => api_error_response(&err),
    }
}
