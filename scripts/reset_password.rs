//! Resets an account's password.
//!
//! Usage: `reset-password <email> <new-password>`, or via the
//! `RESET_EMAIL` and `RESET_PASSWORD` environment variables.

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use fieldguide_server::auth::hash_password;
use fieldguide_server::{create_store, ServerConfig};
use fieldguide_store::KnowledgeStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let email = args.next().or_else(|| std::env::var("RESET_EMAIL").ok());
    let password = args.next().or_else(|| std::env::var("RESET_PASSWORD").ok());
    let (Some(email), Some(password)) = (email, password) else {
        bail!("Usage: reset-password <email> <new-password>");
    };

    let config = ServerConfig::load().context("Failed to load configuration")?;
    let store = create_store(&config).context("Failed to open store")?;

    let Some(mut user) = store.get_user_by_email(&email).await? else {
        bail!("No account with email {}", email);
    };
    user.password_hash = hash_password(&password).context("Failed to hash password")?;
    store.update_user(&user).await?;

    println!("Password reset for {}", email);
    Ok(())
}
