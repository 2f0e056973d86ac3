//! Dumps the entire store to a JSON backup file.
//!
//! Usage: `backup [PATH]`. The path defaults to `BACKUP_PATH` or
//! `backup_data.json`.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fieldguide_server::{create_store, ServerConfig};
use fieldguide_store::snapshot::StoreSnapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load().context("Failed to load configuration")?;
    let store = create_store(&config).context("Failed to open store")?;

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BACKUP_PATH").ok())
        .unwrap_or_else(|| "backup_data.json".to_string());

    let snapshot = StoreSnapshot::capture(store.as_ref())
        .await
        .context("Failed to read store")?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path))?;

    println!("Backed up {} records to {}", snapshot.record_count(), path);
    Ok(())
}
