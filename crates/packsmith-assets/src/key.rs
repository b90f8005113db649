use std::fmt;
use std::path::{Path, PathBuf};

/// What a cached payload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Model,
    Texture,
    Image,
}

impl AssetKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Texture => "texture",
            Self::Image => "image",
        }
    }
}

/// Identifies one cached payload (an iteration id for models, a panel id for
/// textures, an iteration id plus view index for concept images).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub kind: AssetKind,
    pub id: String,
}

impl AssetKey {
    pub fn new(kind: AssetKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn model(iteration_id: impl Into<String>) -> Self {
        Self::new(AssetKind::Model, iteration_id)
    }

    pub fn texture(panel_id: impl Into<String>) -> Self {
        Self::new(AssetKind::Texture, panel_id)
    }

    /// Concept image `index` of an iteration.
    pub fn image(iteration_id: &str, index: usize) -> Self {
        Self::new(AssetKind::Image, format!("{iteration_id}_{index}"))
    }

    /// `<root>/<kind>/<sanitised id>.bin`
    pub fn disk_path(&self, root: &Path) -> PathBuf {
        root.join(self.kind.as_str())
            .join(format!("{}.bin", sanitize_id(&self.id)))
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// Make an id safe to use as a single file name.
pub fn sanitize_id(id: &str) -> String {
    let cleaned = id.replace(['/', '\\', ':'], "_");
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        format!("_{cleaned}")
    } else {
        cleaned
    }
}
