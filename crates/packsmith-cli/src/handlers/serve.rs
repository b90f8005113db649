//! `serve` command: run the HTTP API with CLI overrides applied.

use anyhow::Result;
use packsmith_axum::ServerConfig;
use packsmith_core::config::AppConfig;

/// Run the HTTP API until the process is stopped.
pub async fn execute(
    config: AppConfig,
    port: Option<u16>,
    allow_origins: Vec<String>,
) -> Result<()> {
    let mut server = ServerConfig::new(config);
    if let Some(port) = port {
        server = server.with_port(port);
    }
    if !allow_origins.is_empty() {
        server = server.with_allowed_origins(allow_origins);
    }
    packsmith_axum::start_server(server).await
}
