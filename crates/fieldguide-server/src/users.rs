//! User account operations: self-registration, login, and admin management.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use fieldguide_store::{Role, StoreError, User};

use crate::api::auth::{LoginResponse, UserResponse};
use crate::auth;
use crate::error::{ServerError, ServerResult};
use crate::server::KnowledgeServer;

impl KnowledgeServer {
    /// Creates an account from the public registration endpoint. A missing
    /// or unrecognized role falls back to WRITER.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        requested_role: Option<&str>,
    ) -> ServerResult<UserResponse> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ServerError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }
        validate_credentials(email, password)?;

        let role = requested_role
            .and_then(|value| value.parse::<Role>().ok())
            .unwrap_or(Role::Writer);

        self.insert_user(email, password, role).await
    }

    /// Verifies credentials and issues an access token. Unknown emails and
    /// wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> ServerResult<LoginResponse> {
        let invalid = || ServerError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        if !auth::verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        let token = self.auth.generate_token(&user.id, user.role)?;
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            token,
            user: UserResponse::from(&user),
        })
    }

    /// Admin-side account creation with an explicit role.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> ServerResult<UserResponse> {
        validate_credentials(email, password)?;
        self.insert_user(email, password, role).await
    }

    /// Lists accounts, newest first.
    pub async fn list_users(&self) -> ServerResult<Vec<UserResponse>> {
        let mut users = self.store.list_users().await?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users.iter().map(UserResponse::from).collect())
    }

    /// Changes an account's role and/or password.
    pub async fn update_user(
        &self,
        user_id: &str,
        role: Option<Role>,
        password: Option<&str>,
    ) -> ServerResult<UserResponse> {
        let mut user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServerError::NotFound("User".to_string()))?;

        if let Some(role) = role {
            user.role = role;
        }
        if let Some(password) = password {
            if password.len() < 6 {
                return Err(ServerError::ValidationError(
                    "Password must be at least 6 characters".to_string(),
                ));
            }
            user.password_hash = auth::hash_password(password)?;
        }

        self.store.update_user(&user).await?;
        info!(user_id = %user.id, "Updated user account");
        Ok(UserResponse::from(&user))
    }

    /// Removes an account.
    pub async fn delete_user(&self, user_id: &str) -> ServerResult<()> {
        if self.store.get_user(user_id).await?.is_none() {
            return Err(ServerError::NotFound("User".to_string()));
        }
        self.store.delete_user(user_id).await?;
        info!(%user_id, "Deleted user account");
        Ok(())
    }

    async fn insert_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> ServerResult<UserResponse> {
        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(ServerError::Conflict("User already exists".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: auth::hash_password(password)?,
            role,
            created_at: Utc::now(),
        };

        self.store.store_user(&user).await.map_err(|err| match err {
            StoreError::Conflict(_) => ServerError::Conflict("User already exists".to_string()),
            other => other.into(),
        })?;

        info!(user_id = %user.id, role = user.role.as_str(), "Created user account");
        Ok(UserResponse::from(&user))
    }
}

fn validate_credentials(email: &str, password: &str) -> ServerResult<()> {
    if !email.contains('@') {
        return Err(ServerError::ValidationError(
            "Invalid email address".to_string(),
        ));
    }
    if password.len() < 6 {
        return Err(ServerError::ValidationError(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}
