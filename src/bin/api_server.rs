// HTTP API server binary for catalog-sync
// Serves the password-gated sync endpoint used by the static log page.

use anyhow::Result;
use catalog_sync::api::ApiServer;
use catalog_sync::config::SyncConfig;
use catalog_sync::sync::SyncRunner;
use catalog_sync::telemetry::init_tracing;
use catalog_sync::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing("info,actix_web=info")?;

    tracing::info!("Initializing catalog-sync API server");

    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();

    let server = ApiServer::from_env()?;
    let config = SyncConfig::from_env()?;
    let runner = SyncRunner::from_config(config)?;

    server.run(runner).await?;

    Ok(())
}
