//! digit-server binary
//!
//! Exits non-zero without binding a port when the configuration or either
//! artifact is unusable.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::load()?;
    server::start_server(config).await?;

    Ok(())
}
