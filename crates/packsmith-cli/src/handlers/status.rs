//! `status` command: one JSON snapshot of every pipeline.

use anyhow::Result;
use serde_json::json;

use crate::bootstrap::CliContext;

/// Print product and packaging status as JSON.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let product = ctx.app().product().status().await?;
    let packaging = ctx.app().panels().status().await?;
    let trellis = ctx.app().trellis().status().await?;
    let report = json!({
        "product": product,
        "packaging": packaging,
        "trellis": trellis,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
