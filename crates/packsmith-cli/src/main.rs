//! CLI entry point - the composition root.

use std::time::Duration;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use packsmith_cli::bootstrap::load_config;
use packsmith_cli::handlers::{dieline, product, serve, status};
use packsmith_cli::{Cli, Commands, bootstrap};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads `env` defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = load_config(cli.db_path)?;
    match command {
        Commands::Serve {
            port,
            allow_origins,
        } => serve::execute(config, port, allow_origins).await?,
        Commands::Dieline {
            package_type,
            width,
            height,
            depth,
            segments,
            svg,
            output,
        } => {
            let dims = dieline::resolve_dimensions(package_type, width, height, depth);
            let format = if svg {
                dieline::Format::Svg
            } else {
                dieline::Format::Json
            };
            dieline::execute(package_type, &dims, segments, format, output.as_deref())?;
        }
        Commands::Create {
            prompt,
            image_count,
        } => {
            let ctx = bootstrap(config).await?;
            product::create(&ctx, prompt, image_count).await?;
        }
        Commands::Edit { prompt } => {
            let ctx = bootstrap(config).await?;
            product::edit(&ctx, prompt).await?;
        }
        Commands::Wait { timeout, interval } => {
            let ctx = bootstrap(config).await?;
            product::wait(
                &ctx,
                Duration::from_secs(timeout),
                Duration::from_millis(interval),
            )
            .await?;
        }
        Commands::Status => {
            let ctx = bootstrap(config).await?;
            status::execute(&ctx).await?;
        }
    }
    Ok(())
}
