use packsmith_core::{PackageDimensions, PackageType};
use serde::{Deserialize, Serialize};

/// Reply to an accepted single-panel request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelAccepted {
    pub status: String,
    pub panel_id: String,
    pub message: String,
}

impl PanelAccepted {
    pub fn generating(panel_id: String) -> Self {
        Self {
            status: "generating".to_string(),
            message: format!("Generating texture for {panel_id} panel"),
            panel_id,
        }
    }
}

/// Reply to an accepted bulk request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAccepted {
    pub status: String,
    pub panel_ids: Vec<String>,
    pub message: String,
    pub total_panels: usize,
}

impl BulkAccepted {
    pub fn generating(panel_ids: Vec<String>) -> Self {
        Self {
            status: "generating".to_string(),
            message: format!("Generating textures for {} panels", panel_ids.len()),
            total_panels: panel_ids.len(),
            panel_ids,
        }
    }
}

/// Body of the 202 returned while a texture is still being generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TexturePending {
    pub status: String,
    pub panel_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureDeleted {
    pub status: String,
    pub panel_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDimensionsRequest {
    pub package_type: PackageType,
    pub dimensions: PackageDimensions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionsUpdated {
    pub status: String,
    pub package_type: PackageType,
    pub dimensions: PackageDimensions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeReset {
    pub message: String,
    pub package_type: PackageType,
    pub dimensions: PackageDimensions,
}

/// `?segments=N` for cylinder tessellation.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GeometryQuery {
    pub segments: Option<usize>,
}
