//! Triangle meshes for packages with one part per printable panel.
//!
//! Each part carries its own 0..1 UVs so a panel texture maps directly onto
//! its face. `v = 0` is the top edge of the texture image.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::PanelFace;
use super::dieline::{GeometryError, circle_segments};
use crate::domain::{PackageDimensions, PackageType};

/// Geometry for a single panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelMesh {
    pub panel_id: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl PanelMesh {
    fn new(face: PanelFace) -> Self {
        Self {
            panel_id: face.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_vertex(&mut self, position: [f64; 3], normal: [f64; 3], uv: [f64; 2]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions
            .push([position[0] as f32, position[1] as f32, position[2] as f32]);
        self.normals
            .push([normal[0] as f32, normal[1] as f32, normal[2] as f32]);
        self.uvs.push([uv[0] as f32, uv[1] as f32]);
        index
    }
}

/// A package mesh made of per-panel parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMesh {
    pub package_type: PackageType,
    pub dimensions: PackageDimensions,
    pub parts: Vec<PanelMesh>,
}

impl PackageMesh {
    pub fn part(&self, panel_id: &str) -> Option<&PanelMesh> {
        self.parts.iter().find(|p| p.panel_id == panel_id)
    }
}

/// Build the package mesh centred at the origin with y up and the front
/// facing +z. `segments` controls the cylinder's radial resolution and is
/// bounded like the dieline's.
pub fn build_mesh(
    package_type: PackageType,
    dims: &PackageDimensions,
    segments: usize,
) -> Result<PackageMesh, GeometryError> {
    let segments = circle_segments(segments)?;
    if !dims.is_valid() {
        return Err(GeometryError::InvalidDimensions {
            width: dims.width,
            height: dims.height,
            depth: dims.depth,
        });
    }
    let parts = match package_type {
        PackageType::Box => box_parts(dims),
        PackageType::Cylinder => cylinder_parts(dims, segments),
    };
    Ok(PackageMesh {
        package_type,
        dimensions: *dims,
        parts,
    })
}

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Quad from its bottom-left corner spanned by `u` (rightwards) and `v`
/// (upwards); `u × v` points along `normal`.
fn quad(
    face: PanelFace,
    corner: [f64; 3],
    u: [f64; 3],
    v: [f64; 3],
    normal: [f64; 3],
) -> PanelMesh {
    let mut mesh = PanelMesh::new(face);
    let bl = mesh.push_vertex(corner, normal, [0.0, 1.0]);
    let br = mesh.push_vertex(add(corner, u), normal, [1.0, 1.0]);
    let tr = mesh.push_vertex(add(add(corner, u), v), normal, [1.0, 0.0]);
    let tl = mesh.push_vertex(add(corner, v), normal, [0.0, 0.0]);
    mesh.indices.extend_from_slice(&[bl, br, tr, bl, tr, tl]);
    mesh
}

fn box_parts(dims: &PackageDimensions) -> Vec<PanelMesh> {
    let (w, h, d) = (dims.width, dims.height, dims.depth);
    let (hw, hh, hd) = (w / 2.0, h / 2.0, d / 2.0);
    vec![
        quad(
            PanelFace::Front,
            [-hw, -hh, hd],
            [w, 0.0, 0.0],
            [0.0, h, 0.0],
            [0.0, 0.0, 1.0],
        ),
        quad(
            PanelFace::Back,
            [hw, -hh, -hd],
            [-w, 0.0, 0.0],
            [0.0, h, 0.0],
            [0.0, 0.0, -1.0],
        ),
        quad(
            PanelFace::Left,
            [-hw, -hh, -hd],
            [0.0, 0.0, d],
            [0.0, h, 0.0],
            [-1.0, 0.0, 0.0],
        ),
        quad(
            PanelFace::Right,
            [hw, -hh, hd],
            [0.0, 0.0, -d],
            [0.0, h, 0.0],
            [1.0, 0.0, 0.0],
        ),
        // top hinges on the front's upper edge
        quad(
            PanelFace::Top,
            [-hw, hh, hd],
            [w, 0.0, 0.0],
            [0.0, 0.0, -d],
            [0.0, 1.0, 0.0],
        ),
        // bottom hinges on the front's lower edge, which is the texture's top
        quad(
            PanelFace::Bottom,
            [-hw, -hh, -hd],
            [w, 0.0, 0.0],
            [0.0, 0.0, d],
            [0.0, -1.0, 0.0],
        ),
    ]
}

// segments is bounded by MAX_CIRCLE_SEGMENTS, so the u32 casts cannot truncate
#[allow(clippy::cast_possible_truncation)]
fn cylinder_parts(dims: &PackageDimensions, segments: usize) -> Vec<PanelMesh> {
    let r = dims.width / 2.0;
    let hh = dims.height / 2.0;
    let angle = |i: usize| 2.0 * PI * i as f64 / segments as f64;

    // Side wall: the seam sits at the front (+z) and u runs towards +x.
    let mut body = PanelMesh::new(PanelFace::Body);
    for i in 0..=segments {
        let (s, c) = angle(i).sin_cos();
        let u = i as f64 / segments as f64;
        let normal = [s, 0.0, c];
        body.push_vertex([r * s, -hh, r * c], normal, [u, 1.0]);
        body.push_vertex([r * s, hh, r * c], normal, [u, 0.0]);
    }
    for i in 0..segments as u32 {
        let (b0, t0, b1, t1) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        body.indices.extend_from_slice(&[b0, b1, t1, b0, t1, t0]);
    }

    let cap = |face: PanelFace, y: f64, up: bool| {
        let mut mesh = PanelMesh::new(face);
        let normal = [0.0, if up { 1.0 } else { -1.0 }, 0.0];
        let center = mesh.push_vertex([0.0, y, 0.0], normal, [0.5, 0.5]);
        for i in 0..segments {
            let (s, c) = angle(i).sin_cos();
            // the front of the package meets the edge of the cap nearest the body
            let v = if up { 0.5 + 0.5 * c } else { 0.5 - 0.5 * c };
            mesh.push_vertex([r * s, y, r * c], normal, [0.5 + 0.5 * s, v]);
        }
        let n = segments as u32;
        for i in 0..n {
            let a = center + 1 + i;
            let b = center + 1 + (i + 1) % n;
            if up {
                mesh.indices.extend_from_slice(&[center, a, b]);
            } else {
                mesh.indices.extend_from_slice(&[center, b, a]);
            }
        }
        mesh
    };

    vec![
        body,
        cap(PanelFace::Top, hh, true),
        cap(PanelFace::Bottom, -hh, false),
    ]
}
