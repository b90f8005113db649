//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the HTTP adapter. Generators without credentials are replaced by
//! stand-ins that fail every call with a clear message, so the server still
//! starts and serves state, geometry and cached assets.

use std::sync::Arc;

use anyhow::Result;
use packsmith_assets::{AssetCache, HttpBlobSource};
use packsmith_core::config::AppConfig;
use packsmith_core::ports::{BlobSource, ChatGenerator, ImageGenerator, ModelGenerator};
use packsmith_core::services::{AppCore, ArtifactWriter};
use packsmith_db::{CoreFactory, setup_database};
use packsmith_fal::{DefaultFalClient, FalConfig, UnconfiguredFal};
use packsmith_gemini::{DefaultGeminiClient, GeminiConfig, UnconfiguredGemini};
use tracing::{info, warn};

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub app: AppConfig,
    pub cors: CorsConfig,
}

impl ServerConfig {
    pub fn new(app: AppConfig) -> Self {
        Self {
            app,
            cors: CorsConfig::default(),
        }
    }

    /// Override the listening port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.app.port = port;
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

/// Services handed to every handler.
pub struct AxumContext {
    pub core: Arc<AppCore>,
    pub assets: Arc<AssetCache>,
}

impl AxumContext {
    pub const fn new(core: Arc<AppCore>, assets: Arc<AssetCache>) -> Self {
        Self { core, assets }
    }
}

fn image_and_chat(config: &AppConfig) -> Result<(Arc<dyn ImageGenerator>, Arc<dyn ChatGenerator>)> {
    let gemini = GeminiConfig::from_settings(&config.gemini);
    if !gemini.is_configured() {
        warn!(
            target: "packsmith.bootstrap",
            "GEMINI_API_KEY not set; image and chat routes will fail"
        );
        let images: Arc<dyn ImageGenerator> = Arc::new(UnconfiguredGemini);
        let chat: Arc<dyn ChatGenerator> = Arc::new(UnconfiguredGemini);
        return Ok((images, chat));
    }
    let client = Arc::new(DefaultGeminiClient::new(gemini)?);
    let images: Arc<dyn ImageGenerator> = client.clone();
    let chat: Arc<dyn ChatGenerator> = client;
    Ok((images, chat))
}

fn model_generator(config: &AppConfig) -> Result<Arc<dyn ModelGenerator>> {
    let fal = FalConfig::from_settings(&config.trellis);
    if !fal.is_configured() {
        warn!(target: "packsmith.bootstrap", "FAL_KEY not set; 3D generation will fail");
        return Ok(Arc::new(UnconfiguredFal));
    }
    Ok(Arc::new(DefaultFalClient::new(fal)?))
}

/// Open storage and build the generators into an [`AppCore`].
///
/// Shared with the CLI so both entry points wire the same adapters.
pub async fn build_core(config: &AppConfig) -> Result<AppCore> {
    info!(
        target: "packsmith.paths",
        database_path = %config.db_path.display(),
        cache_dir = %config.cache_dir.display(),
        save_artifacts = config.save_artifacts_locally,
        "Bootstrap resolved paths"
    );

    let pool = setup_database(&config.db_path).await?;
    let (images, chat) = image_and_chat(config)?;
    let models = model_generator(config)?;

    let core = CoreFactory::build_app_core(pool, images, chat, models);
    if !config.save_artifacts_locally {
        return Ok(core);
    }
    info!(
        target: "packsmith.bootstrap",
        dir = %config.artifacts_dir.display(),
        "Saving artifacts locally"
    );
    let source: Arc<dyn BlobSource> = Arc::new(HttpBlobSource::new()?);
    Ok(core.with_artifacts(ArtifactWriter::new(&config.artifacts_dir, source)))
}

/// Build the core and the asset cache.
pub async fn bootstrap(config: &AppConfig) -> Result<AxumContext> {
    let core = build_core(config).await?;
    let assets = AssetCache::new(&config.cache_dir, Arc::new(HttpBlobSource::new()?));
    Ok(AxumContext::new(Arc::new(core), Arc::new(assets)))
}

/// Start the web server and serve until the process stops.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config.app).await?;
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.app.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("packsmith API listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
