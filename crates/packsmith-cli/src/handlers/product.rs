//! Create, edit and wait on the product pipeline from the terminal.

use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use packsmith_core::ProductStatus;
use tracing::debug;

use crate::bootstrap::CliContext;

fn print_status(status: &ProductStatus) {
    let message = status.message.as_deref().unwrap_or("");
    println!("[{:>3}%] {}: {}", status.progress, status.status, message);
}

fn finish(status: &ProductStatus) -> Result<()> {
    print_status(status);
    if let Some(error) = &status.error {
        bail!("Generation failed: {error}");
    }
    if let Some(model) = &status.model_file {
        println!("Model: {model}");
    }
    Ok(())
}

/// Run the create flow in this process.
pub async fn create(ctx: &CliContext, prompt: String, image_count: u32) -> Result<()> {
    let pipeline = ctx.app().product();
    print_status(&pipeline.start_create(&prompt, image_count).await?);
    pipeline.run_create(prompt, image_count).await;
    finish(&pipeline.status().await?)
}

/// Run the edit flow in this process.
pub async fn edit(ctx: &CliContext, prompt: String) -> Result<()> {
    let pipeline = ctx.app().product();
    print_status(&pipeline.start_edit(&prompt).await?);
    pipeline.run_edit(prompt).await;
    finish(&pipeline.status().await?)
}

/// Poll the stored status until the current run ends.
pub async fn wait(ctx: &CliContext, timeout: Duration, interval: Duration) -> Result<()> {
    let pipeline = ctx.app().product();
    if !pipeline.state().await?.in_progress {
        let status = pipeline.status().await?;
        println!("Nothing is running.");
        return finish(&status);
    }

    let started = Instant::now();
    let mut last = None;
    loop {
        let status = pipeline.status().await?;
        debug!(
            target: "packsmith.cli",
            status = %status.status,
            progress = status.progress,
            "Polled product status"
        );
        if status.is_terminal() {
            return finish(&status);
        }
        let snapshot = (status.status.clone(), status.progress);
        if last.as_ref() != Some(&snapshot) {
            print_status(&status);
            last = Some(snapshot);
        }
        if started.elapsed() >= timeout {
            bail!("Timed out after {}s waiting for generation", timeout.as_secs());
        }
        tokio::time::sleep(interval).await;
    }
}
