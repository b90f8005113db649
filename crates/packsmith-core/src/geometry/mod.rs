//! Package geometry: flat dielines and the 3D panel mesh.
//!
//! Dieline coordinates are millimetres with the origin at the top-left of
//! the layout and y growing downwards (image space). Mesh coordinates are
//! millimetres centred on the package with y up.

pub mod dieline;
pub mod mesh;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{PackageDimensions, PackageType, PanelDimensions};

pub use dieline::{
    CIRCLE_SEGMENTS, DielineLayout, DielinePath, GeometryError, MAX_CIRCLE_SEGMENTS, Panel,
    PathKind, generate_dieline, generate_dieline_with_segments,
};
pub use mesh::{PackageMesh, PanelMesh, build_mesh};

/// A point in dieline space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds enclosing every point, or `None` for an empty slice.
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Express `self` in the 0..1 space of `outer`.
    #[must_use]
    pub fn normalized_in(&self, outer: &Self) -> Self {
        let w = outer.width();
        let h = outer.height();
        Self {
            min_x: (self.min_x - outer.min_x) / w,
            min_y: (self.min_y - outer.min_y) / h,
            max_x: (self.max_x - outer.min_x) / w,
            max_y: (self.max_y - outer.min_y) / h,
        }
    }
}

/// A printable face of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelFace {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
    Body,
}

impl PanelFace {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Body => "body",
        }
    }

    /// Human description used in prompts and logs.
    pub const fn context(self, package_type: PackageType) -> &'static str {
        match (package_type, self) {
            (PackageType::Box, Self::Front) => "front face (primary visible panel)",
            (PackageType::Box, Self::Back) => "back face (opposite side)",
            (PackageType::Box, Self::Left) => "left side panel",
            (PackageType::Box, Self::Right) => "right side panel",
            (PackageType::Box, Self::Top) => "top face (lid/opening area)",
            (PackageType::Box, Self::Bottom) => "bottom face (base)",
            (PackageType::Cylinder, Self::Body) => "cylindrical body wrap (curved surface)",
            (PackageType::Cylinder, Self::Top) => "top circular cap",
            (PackageType::Cylinder, Self::Bottom) => "bottom circular base",
            _ => self.as_str(),
        }
    }
}

impl fmt::Display for PanelFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelFace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "body" => Ok(Self::Body),
            other => Err(format!("Unknown panel '{other}'")),
        }
    }
}

const BOX_FACES: [PanelFace; 6] = [
    PanelFace::Front,
    PanelFace::Back,
    PanelFace::Left,
    PanelFace::Right,
    PanelFace::Top,
    PanelFace::Bottom,
];

const CYLINDER_FACES: [PanelFace; 3] = [PanelFace::Body, PanelFace::Top, PanelFace::Bottom];

/// Printable faces of a package type, in display order.
pub const fn panel_faces(package_type: PackageType) -> &'static [PanelFace] {
    match package_type {
        PackageType::Box => &BOX_FACES,
        PackageType::Cylinder => &CYLINDER_FACES,
    }
}

/// Flat size of one face, or `None` when the face does not exist on this shape.
pub fn panel_dimensions(
    package_type: PackageType,
    dims: &PackageDimensions,
    face: PanelFace,
) -> Option<PanelDimensions> {
    let PackageDimensions {
        width,
        height,
        depth,
    } = *dims;
    match (package_type, face) {
        (PackageType::Box, PanelFace::Front | PanelFace::Back) => {
            Some(PanelDimensions::new(width, height))
        }
        (PackageType::Box, PanelFace::Left | PanelFace::Right) => {
            Some(PanelDimensions::new(depth, height))
        }
        (PackageType::Box, PanelFace::Top | PanelFace::Bottom) => {
            Some(PanelDimensions::new(width, depth))
        }
        (PackageType::Cylinder, PanelFace::Body) => {
            Some(PanelDimensions::new(std::f64::consts::PI * width, height))
        }
        (PackageType::Cylinder, PanelFace::Top | PanelFace::Bottom) => {
            Some(PanelDimensions::new(width, width))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_points() {
        let b = Bounds::from_points(&[
            Point2::new(3.0, 4.0),
            Point2::new(-1.0, 10.0),
            Point2::new(2.0, 0.5),
        ])
        .unwrap();
        assert_eq!(b.min_x, -1.0);
        assert_eq!(b.max_y, 10.0);
        assert_eq!(b.width(), 4.0);
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn normalized_bounds() {
        let outer = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 200.0,
            max_y: 100.0,
        };
        let inner = Bounds {
            min_x: 50.0,
            min_y: 25.0,
            max_x: 100.0,
            max_y: 50.0,
        };
        let uv = inner.normalized_in(&outer);
        assert_eq!((uv.min_x, uv.min_y, uv.max_x, uv.max_y), (0.25, 0.25, 0.5, 0.5));
    }

    #[test]
    fn box_panel_sizes() {
        let dims = PackageDimensions::new(100.0, 150.0, 60.0);
        let side = panel_dimensions(PackageType::Box, &dims, PanelFace::Left).unwrap();
        assert_eq!((side.width, side.height), (60.0, 150.0));
        let top = panel_dimensions(PackageType::Box, &dims, PanelFace::Top).unwrap();
        assert_eq!((top.width, top.height), (100.0, 60.0));
        assert!(panel_dimensions(PackageType::Box, &dims, PanelFace::Body).is_none());
    }

    #[test]
    fn cylinder_body_wraps_circumference() {
        let dims = PackageDimensions::new(80.0, 150.0, 80.0);
        let body = panel_dimensions(PackageType::Cylinder, &dims, PanelFace::Body).unwrap();
        assert!((body.width - 251.327).abs() < 1e-3);
        assert!(panel_dimensions(PackageType::Cylinder, &dims, PanelFace::Left).is_none());
    }

    #[test]
    fn face_names_round_trip_through_from_str() {
        for face in panel_faces(PackageType::Box)
            .iter()
            .chain(panel_faces(PackageType::Cylinder))
        {
            assert_eq!(face.as_str().parse::<PanelFace>().unwrap(), *face);
        }
    }
}
