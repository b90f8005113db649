//! Dieline layout generation for boxes and cylinders.
//!
//! Every panel is described by its outline polygon; panel bounds, UV
//! rectangles and the cut/fold classification are all derived from those
//! outlines. An edge shared by two regions is a fold, anything else is cut.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Bounds, PanelFace, Point2, panel_dimensions, panel_faces};
use crate::domain::{PackageDimensions, PackageType, PanelDimensions};

/// Segments used to approximate cylinder caps.
pub const CIRCLE_SEGMENTS: usize = 64;

const MIN_CIRCLE_SEGMENTS: usize = 8;
/// Upper bound on circle resolution accepted from callers.
pub const MAX_CIRCLE_SEGMENTS: usize = 512;
const BOX_GLUE_FLAP_MM: f64 = 15.0;
const CYLINDER_GLUE_FLAP_MM: f64 = 10.0;
/// Region id of the glue flap. Not printable, so never a panel.
pub const GLUE_FLAP_ID: &str = "glue_flap";

/// Errors raised while building a dieline.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("Invalid package dimensions: {width}mm x {height}mm x {depth}mm")]
    InvalidDimensions { width: f64, height: f64, depth: f64 },
    #[error("Invalid circle segments: {segments} (at most {max})")]
    InvalidSegments { segments: usize, max: usize },
}

/// Clamp a requested circle resolution to at least 8, rejecting values
/// above [`MAX_CIRCLE_SEGMENTS`].
pub(crate) const fn circle_segments(segments: usize) -> Result<usize, GeometryError> {
    if segments > MAX_CIRCLE_SEGMENTS {
        return Err(GeometryError::InvalidSegments {
            segments,
            max: MAX_CIRCLE_SEGMENTS,
        });
    }
    Ok(if segments < MIN_CIRCLE_SEGMENTS {
        MIN_CIRCLE_SEGMENTS
    } else {
        segments
    })
}

/// Whether a path is cut through or folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    Cut,
    Fold,
}

/// One stroke of the dieline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DielinePath {
    /// Owning region for cut edges; `None` for folds shared by two regions.
    pub panel_id: Option<String>,
    pub kind: PathKind,
    pub points: Vec<Point2>,
    pub closed: bool,
}

/// A printable panel within the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    pub face: PanelFace,
    pub outline: Vec<Point2>,
    pub bounds: Bounds,
    pub dimensions: PanelDimensions,
    /// Panel bounds normalised to the layout bounds (v grows downwards).
    pub uv: Bounds,
}

/// A complete flat layout for one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DielineLayout {
    pub package_type: PackageType,
    pub dimensions: PackageDimensions,
    pub panels: Vec<Panel>,
    pub glue_flap: Vec<Point2>,
    pub paths: Vec<DielinePath>,
    pub bounds: Bounds,
}

impl DielineLayout {
    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    pub fn cut_paths(&self) -> impl Iterator<Item = &DielinePath> {
        self.paths.iter().filter(|p| p.kind == PathKind::Cut)
    }

    pub fn fold_paths(&self) -> impl Iterator<Item = &DielinePath> {
        self.paths.iter().filter(|p| p.kind == PathKind::Fold)
    }

    /// Render the layout as an SVG document in millimetre units.
    ///
    /// Cut lines are solid, folds dashed.
    pub fn to_svg(&self) -> String {
        let b = &self.bounds;
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.2}mm" height="{h:.2}mm" viewBox="{x:.2} {y:.2} {w:.2} {h:.2}">"#,
            x = b.min_x,
            y = b.min_y,
            w = b.width(),
            h = b.height(),
        );
        for path in &self.paths {
            let d = path
                .points
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{}{:.3},{:.3}", if i == 0 { 'M' } else { 'L' }, p.x, p.y))
                .collect::<Vec<_>>()
                .join(" ");
            let close = if path.closed { " Z" } else { "" };
            let style = match path.kind {
                PathKind::Cut => r##"stroke="#000000""##,
                PathKind::Fold => r##"stroke="#d0021b" stroke-dasharray="4 2""##,
            };
            let _ = writeln!(
                svg,
                r#"  <path d="{d}{close}" fill="none" {style} stroke-width="0.3"/>"#
            );
        }
        svg.push_str("</svg>\n");
        svg
    }
}

/// Build the dieline for a package using the default cap resolution.
pub fn generate_dieline(
    package_type: PackageType,
    dims: &PackageDimensions,
) -> Result<DielineLayout, GeometryError> {
    generate_dieline_with_segments(package_type, dims, CIRCLE_SEGMENTS)
}

/// Build the dieline for a package, approximating circles with `segments`
/// straight edges (at least 8, at most [`MAX_CIRCLE_SEGMENTS`]).
pub fn generate_dieline_with_segments(
    package_type: PackageType,
    dims: &PackageDimensions,
    segments: usize,
) -> Result<DielineLayout, GeometryError> {
    let segments = circle_segments(segments)?;
    if !dims.is_valid() {
        return Err(GeometryError::InvalidDimensions {
            width: dims.width,
            height: dims.height,
            depth: dims.depth,
        });
    }

    let (outlines, glue_flap) = match package_type {
        PackageType::Box => box_outlines(dims),
        PackageType::Cylinder => cylinder_outlines(dims, segments),
    };

    let mut bounds = Bounds::from_points(&glue_flap).unwrap_or(Bounds {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    });
    for (_, outline) in &outlines {
        if let Some(b) = Bounds::from_points(outline) {
            bounds = bounds.union(&b);
        }
    }

    let panels = outlines
        .iter()
        .filter_map(|(face, outline)| {
            let panel_bounds = Bounds::from_points(outline)?;
            let dimensions = panel_dimensions(package_type, dims, *face)?;
            Some(Panel {
                id: face.as_str().to_string(),
                face: *face,
                outline: outline.clone(),
                bounds: panel_bounds,
                dimensions,
                uv: panel_bounds.normalized_in(&bounds),
            })
        })
        .collect();

    let mut regions: Vec<(&str, &[Point2])> = outlines
        .iter()
        .map(|(face, outline)| (face.as_str(), outline.as_slice()))
        .collect();
    regions.push((GLUE_FLAP_ID, glue_flap.as_slice()));
    let paths = classify_edges(&regions);

    Ok(DielineLayout {
        package_type,
        dimensions: *dims,
        panels,
        glue_flap,
        paths,
        bounds,
    })
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Vec<Point2> {
    vec![
        Point2::new(x, y),
        Point2::new(x + w, y),
        Point2::new(x + w, y + h),
        Point2::new(x, y + h),
    ]
}

/// Trapezoid flap hinged on the vertical line `x` between `y` and `y + h`.
fn glue_flap(x: f64, y: f64, width: f64, h: f64) -> Vec<Point2> {
    let taper = (width / 2.0).min(h / 4.0);
    vec![
        Point2::new(x, y),
        Point2::new(x + width, y + taper),
        Point2::new(x + width, y + h - taper),
        Point2::new(x, y + h),
    ]
}

fn circle(cx: f64, cy: f64, r: f64, segments: usize) -> Vec<Point2> {
    (0..segments)
        .map(|i| {
            let a = 2.0 * PI * i as f64 / segments as f64;
            Point2::new(cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

type Outlines = (Vec<(PanelFace, Vec<Point2>)>, Vec<Point2>);

/// Cross layout: `left | front | right | back | flap` with top and bottom
/// hinged on the front panel.
fn box_outlines(dims: &PackageDimensions) -> Outlines {
    let PackageDimensions {
        width: w,
        height: h,
        depth: d,
    } = *dims;

    let x_front = d;
    let x_right = x_front + w;
    let x_back = x_right + d;
    let x_flap = x_back + w;
    let y_row = d;

    let outlines = vec![
        (PanelFace::Front, rect(x_front, y_row, w, h)),
        (PanelFace::Back, rect(x_back, y_row, w, h)),
        (PanelFace::Left, rect(0.0, y_row, d, h)),
        (PanelFace::Right, rect(x_right, y_row, d, h)),
        (PanelFace::Top, rect(x_front, 0.0, w, d)),
        (PanelFace::Bottom, rect(x_front, y_row + h, w, d)),
    ];
    let flap = glue_flap(x_flap, y_row, BOX_GLUE_FLAP_MM.min(d / 2.0), h);
    debug_assert_eq!(outlines.len(), panel_faces(PackageType::Box).len());
    (outlines, flap)
}

/// Body wrap with the caps centred above and below it.
fn cylinder_outlines(dims: &PackageDimensions, segments: usize) -> Outlines {
    let diameter = dims.width;
    let h = dims.height;
    let r = diameter / 2.0;
    let circumference = PI * diameter;
    let cx = circumference / 2.0;

    let outlines = vec![
        (PanelFace::Body, rect(0.0, diameter, circumference, h)),
        (PanelFace::Top, circle(cx, r, r, segments)),
        (PanelFace::Bottom, circle(cx, diameter + h + r, r, segments)),
    ];
    let flap = glue_flap(
        circumference,
        diameter,
        CYLINDER_GLUE_FLAP_MM.min(circumference / 4.0),
        h,
    );
    (outlines, flap)
}

/// Quantised, direction-independent edge key (0.1 µm resolution).
type EdgeKey = ((i64, i64), (i64, i64));

#[allow(clippy::cast_possible_truncation)]
fn quantize(p: Point2) -> (i64, i64) {
    ((p.x * 10_000.0).round() as i64, (p.y * 10_000.0).round() as i64)
}

fn edge_key(a: Point2, b: Point2) -> EdgeKey {
    let (qa, qb) = (quantize(a), quantize(b));
    if qa <= qb { (qa, qb) } else { (qb, qa) }
}

fn classify_edges(regions: &[(&str, &[Point2])]) -> Vec<DielinePath> {
    struct Edge<'a> {
        owner: &'a str,
        from: Point2,
        to: Point2,
        uses: usize,
    }

    let mut order: Vec<EdgeKey> = Vec::new();
    let mut edges: HashMap<EdgeKey, Edge<'_>> = HashMap::new();

    for &(owner, outline) in regions {
        let n = outline.len();
        for i in 0..n {
            let (from, to) = (outline[i], outline[(i + 1) % n]);
            let key = edge_key(from, to);
            edges
                .entry(key)
                .and_modify(|e| e.uses += 1)
                .or_insert_with(|| {
                    order.push(key);
                    Edge {
                        owner,
                        from,
                        to,
                        uses: 1,
                    }
                });
        }
    }

    order
        .iter()
        .filter_map(|key| edges.get(key))
        .map(|edge| {
            let shared = edge.uses > 1;
            DielinePath {
                panel_id: (!shared).then(|| edge.owner.to_string()),
                kind: if shared { PathKind::Fold } else { PathKind::Cut },
                points: vec![edge.from, edge.to],
                closed: false,
            }
        })
        .collect()
}
