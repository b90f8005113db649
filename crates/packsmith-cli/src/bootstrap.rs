//! CLI bootstrap - the composition root.
//!
//! Configuration comes from the environment (after `.env` is loaded) with
//! command-line overrides applied on top.

use std::path::PathBuf;

use anyhow::Result;
use packsmith_core::config::AppConfig;
use packsmith_core::services::AppCore;

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub app: AppCore,
}

impl CliContext {
    /// Core services shared by every command.
    pub const fn app(&self) -> &AppCore {
        &self.app
    }
}

/// Read configuration, applying a database override when given.
pub fn load_config(db_path: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;
    if let Some(path) = db_path {
        config.db_path = path;
    }
    Ok(config)
}

/// Bootstrap the CLI context with all adapters wired.
pub async fn bootstrap(config: AppConfig) -> Result<CliContext> {
    let app = packsmith_axum::build_core(&config).await?;
    Ok(CliContext { app })
}
