//! Authentication endpoints and request guards.
//!
//! Guards are plain extractors over the bearer token: [`AuthUser`] requires a
//! valid token, [`OptionalAuthUser`] tolerates a missing one, and
//! [`AdminUser`] additionally requires the admin role.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use fieldguide_store::{Role, User};

use crate::server::KnowledgeServer;

use super::errors::{api_error_response, message_response};

/// Authenticated caller, decoded from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

/// Caller identity when credentials are optional. A missing token yields
/// `None`; a token that is present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

/// [`AuthUser`] narrowed to administrators.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|header| header.strip_prefix("Bearer ").unwrap_or(header))
}

#[async_trait]
impl FromRequestParts<Arc<KnowledgeServer>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &Arc<KnowledgeServer>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(message_response(
                StatusCode::UNAUTHORIZED,
                "No token provided",
            ));
        };
        match server.auth().verify_token(token) {
            Ok(claims) => Ok(AuthUser {
                id: claims.sub,
                role: claims.role,
            }),
            Err(_) => Err(message_response(
                StatusCode::UNAUTHORIZED,
                "Unauthorized: Invalid token",
            )),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<KnowledgeServer>> for OptionalAuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &Arc<KnowledgeServer>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(OptionalAuthUser(None));
        };
        match server.auth().verify_token(token) {
            Ok(claims) => Ok(OptionalAuthUser(Some(AuthUser {
                id: claims.sub,
                role: claims.role,
            }))),
            Err(_) => Err(message_response(StatusCode::UNAUTHORIZED, "Invalid token")),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<KnowledgeServer>> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &Arc<KnowledgeServer>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, server).await?;
        if !user.role.is_admin() {
            return Err(message_response(
                StatusCode::FORBIDDEN,
                "Forbidden: Insufficient permissions",
            ));
        }
        Ok(AdminUser(user))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

pub async fn register_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    match server
        .register_user(&req.email, &req.password, req.role.as_deref())
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, "Registered user");
            (
                StatusCode::CREATED,
                Json(json!({ "message": "User registered successfully", "user": user })),
            )
                .into_response()
        }
        Err(err) => {
            error!(?err, "Failed to register user");
            api_error_response(&err)
        }
    }
}

pub async fn login_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    match server.login(&req.email, &req.password).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn me_handler(user: AuthUser) -> impl IntoResponse {
    Json(json!({ "id": user.id, "role": user.role }))
}
