//! Offline dieline export.

use std::path::Path;

use anyhow::{Context, Result};
use packsmith_core::geometry::{CIRCLE_SEGMENTS, generate_dieline_with_segments};
use packsmith_core::{DielineLayout, PackageDimensions, PackageType};

/// Output encoding of the exported layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Svg,
}

/// Fill unset dimensions from the shape defaults. Cylinders mirror width
/// into depth.
pub fn resolve_dimensions(
    package_type: PackageType,
    width: Option<f64>,
    height: Option<f64>,
    depth: Option<f64>,
) -> PackageDimensions {
    let defaults = package_type.default_dimensions();
    PackageDimensions::new(
        width.unwrap_or(defaults.width),
        height.unwrap_or(defaults.height),
        depth.unwrap_or(defaults.depth),
    )
    .normalized_for(package_type)
}

pub fn layout(
    package_type: PackageType,
    dimensions: &PackageDimensions,
    segments: Option<usize>,
) -> Result<DielineLayout> {
    generate_dieline_with_segments(
        package_type,
        dimensions,
        segments.unwrap_or(CIRCLE_SEGMENTS),
    )
    .with_context(|| format!("Cannot lay out a {package_type} of {dimensions:?}"))
}

pub fn execute(
    package_type: PackageType,
    dimensions: &PackageDimensions,
    segments: Option<usize>,
    format: Format,
    output: Option<&Path>,
) -> Result<()> {
    let layout = layout(package_type, dimensions, segments)?;
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(&layout)?,
        Format::Svg => layout.to_svg(),
    };
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Dieline written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
