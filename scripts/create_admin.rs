//! Creates or promotes the bootstrap admin account.
//!
//! `ADMIN_EMAIL` and `ADMIN_PASSWORD` override the defaults. An existing
//! account under the email is promoted and gets the new password.

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use fieldguide_server::auth::hash_password;
use fieldguide_server::{create_store, ServerConfig};
use fieldguide_store::{KnowledgeStore, Role, User};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load().context("Failed to load configuration")?;
    let store = create_store(&config).context("Failed to open store")?;

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let password_hash = hash_password(&password).context("Failed to hash password")?;

    match store.get_user_by_email(&email).await? {
        Some(mut user) => {
            user.role = Role::Admin;
            user.password_hash = password_hash;
            store.update_user(&user).await?;
            println!("Promoted existing account {} to ADMIN", email);
        }
        None => {
            let user = User {
                id: Uuid::new_v4().to_string(),
                email: email.clone(),
                password_hash,
                role: Role::Admin,
                created_at: Utc::now(),
            };
            store.store_user(&user).await?;
            println!("Created admin account {}", email);
        }
    }
    Ok(())
}
