//! Loads a JSON backup into the configured store.
//!
//! A missing backup file is not an error, so provisioning can run this
//! unconditionally. A file-backed store is wiped before the records are
//! replayed in dependency order.

use std::path::Path;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fieldguide_server::{create_store, ServerConfig};
use fieldguide_store::snapshot::StoreSnapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BACKUP_PATH").ok())
        .unwrap_or_else(|| "backup_data.json".to_string());
    if !Path::new(&path).exists() {
        println!("No backup file found. Skipping restore.");
        return Ok(());
    }

    let config = ServerConfig::load().context("Failed to load configuration")?;

    if let Some(dir) = config.store_url.strip_prefix("file://") {
        if Path::new(dir).exists() {
            std::fs::remove_dir_all(dir).with_context(|| format!("Failed to clear {}", dir))?;
        }
    }

    let store = create_store(&config).context("Failed to open store")?;
    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let snapshot: StoreSnapshot =
        serde_json::from_str(&contents).context("Backup file is not valid JSON")?;
    snapshot
        .apply(store.as_ref())
        .await
        .context("Failed to restore records")?;

    println!("Restored {} records from {}", snapshot.record_count(), path);
    Ok(())
}
