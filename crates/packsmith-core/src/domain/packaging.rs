//! Packaging design session types.
//!
//! Each package shape keeps its own dimensions and panel textures so that
//! switching between a box and a cylinder does not lose work on the other.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported package shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    Box,
    Cylinder,
}

impl PackageType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Cylinder => "cylinder",
        }
    }

    /// Dimensions a freshly reset shape starts with.
    pub const fn default_dimensions(self) -> PackageDimensions {
        match self {
            Self::Box => PackageDimensions::new(100.0, 150.0, 100.0),
            Self::Cylinder => PackageDimensions::new(80.0, 150.0, 80.0),
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "box" => Ok(Self::Box),
            "cylinder" => Ok(Self::Cylinder),
            other => Err(format!("Unknown package type '{other}'. Expected 'box' or 'cylinder'")),
        }
    }
}

/// Package dimensions in millimetres.
///
/// For cylinders `width` is the diameter and `depth` mirrors it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageDimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl PackageDimensions {
    pub const fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Apply the shape's constraints: a cylinder's depth is its diameter.
    #[must_use]
    pub const fn normalized_for(self, package_type: PackageType) -> Self {
        match package_type {
            PackageType::Box => self,
            PackageType::Cylinder => Self::new(self.width, self.height, self.width),
        }
    }

    /// All three sides are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.width, self.height, self.depth]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Width and height of a single flat panel in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelDimensions {
    pub width: f64,
    pub height: f64,
}

impl PanelDimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Generated texture for a specific panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelTexture {
    /// e.g. "front", "back", "body".
    pub panel_id: String,
    /// Data URL or remote URL.
    pub texture_url: String,
    pub prompt: String,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub dimensions: Option<PanelDimensions>,
}

impl PanelTexture {
    pub fn new(
        panel_id: impl Into<String>,
        texture_url: impl Into<String>,
        prompt: impl Into<String>,
        dimensions: Option<PanelDimensions>,
    ) -> Self {
        Self {
            panel_id: panel_id.into(),
            texture_url: texture_url.into(),
            prompt: prompt.into(),
            generated_at: Utc::now(),
            dimensions,
        }
    }
}

/// Per-shape design state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeState {
    pub dimensions: PackageDimensions,
    pub panel_textures: BTreeMap<String, PanelTexture>,
}

impl ShapeState {
    pub fn for_type(package_type: PackageType) -> Self {
        Self {
            dimensions: package_type.default_dimensions(),
            panel_textures: BTreeMap::new(),
        }
    }
}

impl Default for ShapeState {
    fn default() -> Self {
        Self::for_type(PackageType::Box)
    }
}

fn default_cylinder_state() -> ShapeState {
    ShapeState::for_type(PackageType::Cylinder)
}

/// Single-session source of truth for packaging design (the package model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingState {
    pub current_package_type: PackageType,
    pub box_state: ShapeState,
    #[serde(default = "default_cylinder_state")]
    pub cylinder_state: ShapeState,
    pub in_progress: bool,
    /// Panel being generated by a single-panel request.
    pub generating_panel: Option<String>,
    /// Panels still outstanding in a bulk request.
    pub generating_panels: Vec<String>,
    pub bulk_generation_in_progress: bool,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for PackagingState {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            current_package_type: PackageType::Box,
            box_state: ShapeState::for_type(PackageType::Box),
            cylinder_state: ShapeState::for_type(PackageType::Cylinder),
            in_progress: false,
            generating_panel: None,
            generating_panels: Vec::new(),
            bulk_generation_in_progress: false,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl PackagingState {
    pub const fn shape(&self, package_type: PackageType) -> &ShapeState {
        match package_type {
            PackageType::Box => &self.box_state,
            PackageType::Cylinder => &self.cylinder_state,
        }
    }

    pub fn shape_mut(&mut self, package_type: PackageType) -> &mut ShapeState {
        match package_type {
            PackageType::Box => &mut self.box_state,
            PackageType::Cylinder => &mut self.cylinder_state,
        }
    }

    pub const fn active_shape(&self) -> &ShapeState {
        self.shape(self.current_package_type)
    }

    pub fn active_shape_mut(&mut self) -> &mut ShapeState {
        self.shape_mut(self.current_package_type)
    }

    /// Switch to `package_type` and set its dimensions.
    ///
    /// Cylinder depth always mirrors the width, whatever was passed in.
    pub fn set_package(&mut self, package_type: PackageType, dimensions: PackageDimensions) {
        self.current_package_type = package_type;
        self.shape_mut(package_type).dimensions = dimensions.normalized_for(package_type);
        self.touch();
    }

    /// Record a generation failure and clear every in-progress marker.
    pub fn mark_error(&mut self, error_message: impl Into<String>) {
        self.last_error = Some(error_message.into());
        self.in_progress = false;
        self.generating_panel = None;
        self.bulk_generation_in_progress = false;
        self.generating_panels.clear();
        self.touch();
    }

    /// Set the texture for a panel of the active shape.
    pub fn set_panel_texture(&mut self, texture: PanelTexture) {
        self.active_shape_mut()
            .panel_textures
            .insert(texture.panel_id.clone(), texture);
        self.touch();
    }

    /// Texture for a panel of the active shape.
    pub fn panel_texture(&self, panel_id: &str) -> Option<&PanelTexture> {
        self.active_shape().panel_textures.get(panel_id)
    }

    /// Remove a panel texture from the active shape. Returns whether it existed.
    pub fn remove_panel_texture(&mut self, panel_id: &str) -> bool {
        let removed = self.active_shape_mut().panel_textures.remove(panel_id).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    /// Apply the result of a bulk run in one step.
    ///
    /// With `replace`, panels missing from `textures` lose their texture;
    /// otherwise existing textures for those panels are retained.
    pub fn atomic_update_textures(
        &mut self,
        textures: BTreeMap<String, PanelTexture>,
        replace: bool,
    ) {
        let shape = self.active_shape_mut();
        if replace {
            shape.panel_textures = textures;
        } else {
            shape.panel_textures.extend(textures);
        }
        self.touch();
    }

    /// Reset the active shape to its default dimensions with no textures.
    pub fn reset_current_shape(&mut self) -> PackageDimensions {
        let package_type = self.current_package_type;
        *self.shape_mut(package_type) = ShapeState::for_type(package_type);
        self.touch();
        package_type.default_dimensions()
    }

    /// Whether a single or bulk generation is running.
    pub const fn is_generating(&self) -> bool {
        self.in_progress || self.bulk_generation_in_progress
    }

    /// Poll-friendly summary.
    pub fn status(&self) -> PackagingStatus {
        PackagingStatus {
            in_progress: self.is_generating(),
            generating_panel: self.generating_panel.clone(),
            generating_panels: self.generating_panels.clone(),
            last_error: self.last_error.clone(),
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Lightweight packaging status for polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingStatus {
    pub in_progress: bool,
    pub generating_panel: Option<String>,
    pub generating_panels: Vec<String>,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(panel: &str, url: &str) -> PanelTexture {
        PanelTexture::new(panel, url, "blue stripes", None)
    }

    #[test]
    fn package_type_parses_case_insensitively() {
        assert_eq!("Box".parse::<PackageType>().unwrap(), PackageType::Box);
        assert_eq!(" cylinder ".parse::<PackageType>().unwrap(), PackageType::Cylinder);
        assert!("sphere".parse::<PackageType>().is_err());
    }

    #[test]
    fn textures_are_scoped_to_shape() {
        let mut state = PackagingState::default();
        state.set_panel_texture(texture("front", "data:a"));

        state.set_package(PackageType::Cylinder, PackageType::Cylinder.default_dimensions());
        assert!(state.panel_texture("front").is_none());

        state.set_package(PackageType::Box, PackageType::Box.default_dimensions());
        assert_eq!(state.panel_texture("front").unwrap().texture_url, "data:a");
    }

    #[test]
    fn mark_error_clears_generation_markers() {
        let mut state = PackagingState {
            in_progress: true,
            generating_panel: Some("front".into()),
            generating_panels: vec!["front".into(), "back".into()],
            bulk_generation_in_progress: true,
            ..PackagingState::default()
        };
        state.mark_error("boom");
        assert!(!state.is_generating());
        assert!(state.generating_panel.is_none());
        assert!(state.generating_panels.is_empty());
        assert_eq!(state.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn atomic_update_merges_or_replaces() {
        let mut state = PackagingState::default();
        state.set_panel_texture(texture("front", "old-front"));
        state.set_panel_texture(texture("back", "old-back"));

        let mut fresh = BTreeMap::new();
        fresh.insert("front".to_string(), texture("front", "new-front"));
        state.atomic_update_textures(fresh.clone(), false);
        assert_eq!(state.panel_texture("front").unwrap().texture_url, "new-front");
        assert_eq!(state.panel_texture("back").unwrap().texture_url, "old-back");

        state.atomic_update_textures(fresh, true);
        assert!(state.panel_texture("back").is_none());
    }

    #[test]
    fn reset_restores_defaults_for_active_shape_only() {
        let mut state = PackagingState::default();
        state.set_package(PackageType::Box, PackageDimensions::new(10.0, 20.0, 30.0));
        state.set_panel_texture(texture("front", "x"));
        state.cylinder_state.dimensions = PackageDimensions::new(50.0, 60.0, 50.0);

        let dims = state.reset_current_shape();
        assert_eq!(dims, PackageDimensions::new(100.0, 150.0, 100.0));
        assert!(state.box_state.panel_textures.is_empty());
        assert_eq!(state.cylinder_state.dimensions.width, 50.0);
    }

    #[test]
    fn cylinder_state_defaults_when_missing_from_document() {
        let state: PackagingState = serde_json::from_value(serde_json::json!({
            "current_package_type": "cylinder"
        }))
        .unwrap();
        assert_eq!(state.active_shape().dimensions.width, 80.0);
    }

    #[test]
    fn cylinder_depth_mirrors_width() {
        let mut state = PackagingState::default();
        state.set_package(PackageType::Cylinder, PackageDimensions::new(80.0, 150.0, 50.0));
        assert_eq!(state.active_shape().dimensions, PackageDimensions::new(80.0, 150.0, 80.0));

        // a missing depth deserialises as zero and is filled in
        let dims: PackageDimensions =
            serde_json::from_value(serde_json::json!({ "width": 66.0, "height": 115.0 })).unwrap();
        state.set_package(PackageType::Cylinder, dims);
        assert_eq!(state.active_shape().dimensions.depth, 66.0);

        state.set_package(PackageType::Box, PackageDimensions::new(80.0, 150.0, 50.0));
        assert_eq!(state.active_shape().dimensions.depth, 50.0);
    }

    #[test]
    fn dimension_validation() {
        assert!(PackageDimensions::new(1.0, 1.0, 1.0).is_valid());
        assert!(!PackageDimensions::new(0.0, 1.0, 1.0).is_valid());
        assert!(!PackageDimensions::new(f64::NAN, 1.0, 1.0).is_valid());
        assert!(!PanelDimensions::new(-1.0, 1.0).is_valid());
    }
}
