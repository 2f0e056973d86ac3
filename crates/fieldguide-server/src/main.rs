use anyhow::Context;

use fieldguide_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;
    fieldguide_server::run(config).await.context("Server error")?;
    Ok(())
}
