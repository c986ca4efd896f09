//! Helios Server binary.
//!
//! Configuration comes from `.env`, an optional `helios.{toml,yaml,json}` and
//! `HELIOS__*` environment variables.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    server::start_server(config).await?;
    Ok(())
}
