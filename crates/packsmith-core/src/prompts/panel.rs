//! Structured prompts for flat panel textures.
//!
//! Every builder validates the user's text first, then fills one of three
//! templates: `master` (a 3D mockup is attached as a style reference),
//! `simple` (no reference) and `iteration` (edit an existing panel).

use tracing::debug;

use super::PromptError;
use crate::domain::{PackageDimensions, PanelDimensions};

const MIN_PROMPT_CHARS: usize = 3;
const MAX_PROMPT_CHARS: usize = 2000;
const VAGUE_PROMPTS: [&str; 7] = ["logo", "design", "texture", "pattern", "cool", "nice", "good"];

const MM_PER_INCH: f64 = 25.4;

/// Check a user design prompt for length and specificity.
pub fn validate_user_prompt(prompt: &str) -> Result<(), PromptError> {
    let trimmed = prompt.trim();
    let chars = trimmed.chars().count();
    if chars < MIN_PROMPT_CHARS {
        return Err(PromptError::TooShort);
    }
    if chars > MAX_PROMPT_CHARS {
        return Err(PromptError::TooLong {
            max: MAX_PROMPT_CHARS,
        });
    }
    let lowered = trimmed.to_lowercase();
    if VAGUE_PROMPTS.contains(&lowered.as_str()) {
        return Err(PromptError::TooVague(trimmed.to_string()));
    }
    Ok(())
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

const COMMON_RATIOS: [(f64, &str); 7] = [
    (1.0, "1:1"),
    (1.33, "4:3"),
    (1.5, "3:2"),
    (1.6, "16:10"),
    (1.78, "16:9"),
    (2.0, "2:1"),
    (2.35, "21:9"),
];

/// Aspect ratio of a panel as `"a:b"`.
///
/// Small exact fractions are returned as-is, otherwise the nearest common
/// photographic ratio within 0.1, otherwise the best approximation with a
/// denominator of at most 20.
#[allow(clippy::cast_possible_truncation)]
pub fn aspect_ratio(width: f64, height: f64) -> String {
    if !(width > 0.0 && height > 0.0) {
        return "1:1".to_string();
    }
    let w = (width * 1000.0).round_ties_even() as i64;
    let h = (height * 1000.0).round_ties_even() as i64;
    if w <= 0 || h <= 0 {
        return "1:1".to_string();
    }
    let (num, den) = reduce(w, h);
    if den <= 100 {
        return format!("{num}:{den}");
    }

    let ratio = width / height;
    let closest = COMMON_RATIOS
        .iter()
        .min_by(|a, b| (a.0 - ratio).abs().total_cmp(&(b.0 - ratio).abs()));
    if let Some((value, label)) = closest {
        if (value - ratio).abs() < 0.1 {
            return (*label).to_string();
        }
    }

    let (num, den) = limit_denominator(num, den, 20);
    format!("{num}:{den}")
}

const fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

const fn reduce(num: i64, den: i64) -> (i64, i64) {
    let g = gcd(num, den);
    (num / g, den / g)
}

/// Closest fraction to `num/den` whose denominator is at most `max_den`
/// (continued-fraction convergents, ties favour the last convergent).
fn limit_denominator(num: i64, den: i64, max_den: i64) -> (i64, i64) {
    if den <= max_den {
        return (num, den);
    }
    let (mut p0, mut q0, mut p1, mut q1) = (0_i64, 1_i64, 1_i64, 0_i64);
    let (mut n, mut d) = (num, den);
    while d != 0 {
        let a = n / d;
        let q2 = q0 + a * q1;
        if q2 > max_den {
            break;
        }
        (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
        (n, d) = (d, n - a * d);
    }
    let k = (max_den - q0) / q1;
    let bound1 = (p0 + k * p1, q0 + k * q1);
    let bound2 = (p1, q1);

    // |p/q - num/den| compared without floating point
    let distance = |(p, q): (i64, i64)| {
        let diff = (i128::from(p) * i128::from(den) - i128::from(num) * i128::from(q)).abs();
        (diff, i128::from(q))
    };
    let (d1, s1) = distance(bound1);
    let (d2, s2) = distance(bound2);
    if d2 * s1 <= d1 * s2 { bound2 } else { bound1 }
}

/// Size bucket by the panel's longest side.
pub fn size_description(width_mm: f64, height_mm: f64) -> &'static str {
    let max_dim = width_mm.max(height_mm);
    if max_dim < 50.0 {
        "very small"
    } else if max_dim < 100.0 {
        "small"
    } else if max_dim < 200.0 {
        "medium"
    } else if max_dim < 300.0 {
        "large"
    } else {
        "very large"
    }
}

pub fn orientation(width_mm: f64, height_mm: f64) -> &'static str {
    let ratio = width_mm / height_mm;
    if ratio > 1.3 {
        "landscape (horizontal)"
    } else if ratio < 0.77 {
        "portrait (vertical)"
    } else {
        "square"
    }
}

/// Bullet list of composition hints for a panel of this size and face.
pub fn scale_guidance(width_mm: f64, height_mm: f64, face_name: &str) -> String {
    let max_dim = width_mm.max(height_mm);
    let ratio = width_mm / height_mm;
    let mut lines = Vec::with_capacity(3);

    lines.push(if max_dim < 50.0 {
        "- This is a VERY SMALL panel - keep patterns fine and detailed, avoid large bold elements"
    } else if max_dim < 100.0 {
        "- This is a SMALL panel - use moderately sized patterns, avoid oversized elements"
    } else if max_dim < 200.0 {
        "- This is a MEDIUM panel - balance pattern size with good visibility"
    } else if max_dim < 300.0 {
        "- This is a LARGE panel - use bold patterns and elements that won't look sparse"
    } else {
        "- This is a VERY LARGE panel - use large-scale patterns and bold elements"
    });

    lines.push(if ratio > 1.5 {
        "- LANDSCAPE orientation: favor horizontal patterns, stripes, or wide compositions"
    } else if ratio < 0.67 {
        "- PORTRAIT orientation: favor vertical patterns, stripes, or tall compositions"
    } else {
        "- SQUARE/BALANCED orientation: centered compositions or uniform patterns work well"
    });

    match face_name {
        "front" | "back" => lines.push(
            "- Primary visible face: this is a focal point, consider centering key visual elements",
        ),
        "top" | "bottom" => lines.push(
            "- Top/bottom face: often viewed from above/below, ensure design looks good from that angle",
        ),
        "left" | "right" => {
            lines.push("- Side panel: typically narrower, simpler patterns often work better");
        }
        "body" => lines.push(
            "- Cylindrical body: design will wrap around, ensure seamless horizontal tiling if possible",
        ),
        _ => {}
    }

    lines.join("\n")
}

/// Whole millimetres as shown in templates (truncated).
#[allow(clippy::cast_possible_truncation)]
fn whole_mm(mm: f64) -> i64 {
    mm.trunc() as i64
}

/// Full prompt for a panel of a package.
///
/// Without a reference mockup this falls back to the simple template.
pub fn build_master_prompt(
    face_name: &str,
    panel: PanelDimensions,
    package: PackageDimensions,
    user_prompt: &str,
    has_reference_mockup: bool,
) -> Result<String, PromptError> {
    validate_user_prompt(user_prompt)?;
    if !has_reference_mockup {
        return build_simple_prompt(face_name, panel, user_prompt);
    }

    let aspect_ratio_lock = aspect_ratio(panel.width, panel.height);
    let guidance = scale_guidance(panel.width, panel.height, face_name);
    let orientation = orientation(panel.width, panel.height);
    let size = size_description(panel.width, panel.height);
    let panel_width_in = mm_to_inches(panel.width);
    let panel_height_in = mm_to_inches(panel.height);
    let box_width_in = mm_to_inches(package.width);
    let box_height_in = mm_to_inches(package.height);
    let box_depth_in = mm_to_inches(package.depth);
    let panel_width_mm = whole_mm(panel.width);
    let panel_height_mm = whole_mm(panel.height);

    debug!(
        target: "packsmith.prompts",
        face = face_name,
        aspect_ratio = %aspect_ratio_lock,
        size,
        orientation,
        "Building master panel prompt"
    );

    Ok(format!(
        "You are a packaging panel layout model. A 3D mockup image of the box is attached as reference.

Use it as the strict style and pattern-scale reference.

========================
VARIABLES (filled by pipeline)
========================

FACE_NAME: {face_name}
PANEL_WIDTH_IN: {panel_width_in:.2}
PANEL_HEIGHT_IN: {panel_height_in:.2}
ASPECT_RATIO_LOCK: {aspect_ratio_lock}

Box context (do not change):
- W = {box_width_in:.1} in, H = {box_height_in:.1} in, L = {box_depth_in:.1} in.

========================
GLOBAL STYLE LOCK (must apply exactly)
========================

1) Style source
   - The attached 3D mockup is the authoritative reference for:
     a) checker/tile pattern scale
     b) tile sharpness and spacing
     c) black tone / contrast
   - Do not reinterpret or restyle the pattern.

2) Pattern definition
   - Uniform black checker / tiled texture.
   - Grid is axis-aligned (no rotation).
   - Tile size must visually match the mockup across all panels.

3) Flat print panel rules
   - Orthographic, straight-on, flat design only.
   - No perspective, no shadows, no lighting, no 3D cues.
   - No fold lines, no die-cut marks, no guides.
   - No text, logos, symbols, or extra graphics.

4) Full-bleed, edge-flush rule
   - Pattern must extend to every edge with zero margin.
   - No borders, padding, or safe-area inset.
   - Tiles must meet the edges cleanly. No faded or clipped edge band.

========================
PANEL SPEC (this call only)
========================

Render the face: FACE_NAME = {face_name}

Physical size (inches):
- width  = {panel_width_in:.2}
- height = {panel_height_in:.2}

Aspect ratio lock (hard constraint):
- REQUIRED aspect ratio = {aspect_ratio_lock}
- You MUST generate the panel at this exact ratio.
- Do NOT crop, pad, letterbox, or alter proportions.
- If you pick pixel sizes, compute from inches using a single DPI
  so the final image ratio is exactly {aspect_ratio_lock}.

Edge alignment intent:
- Treat this as part of a continuous wrap.
- Keep the checker grid aligned so edges can match adjacent faces later.

========================
SCALE AND COMPOSITION GUIDANCE
========================

{guidance}

Visual harmony for this panel:
- Scale patterns/elements appropriately for the {size} {orientation} panel
- Ensure composition looks balanced at the actual physical size ({panel_width_mm}mm × {panel_height_mm}mm)
- Pattern density and element sizing should match the reference mockup's visual scale

========================
OUTPUT RULES
========================

- Output exactly ONE image for this panel.
- The image must be the flat panel only.
- Label internally as {face_name}. Do not add visible text on the panel.
- No extra commentary, no extra images. One image only.

========================
USER CUSTOMIZATION
========================

{user_prompt}
"
    ))
}

/// Prompt for a panel texture with no reference image.
pub fn build_simple_prompt(
    face_name: &str,
    panel: PanelDimensions,
    user_prompt: &str,
) -> Result<String, PromptError> {
    validate_user_prompt(user_prompt)?;

    let aspect_ratio_lock = aspect_ratio(panel.width, panel.height);
    let guidance = scale_guidance(panel.width, panel.height, face_name);
    let orientation = orientation(panel.width, panel.height);
    let size = size_description(panel.width, panel.height);
    let panel_width_in = mm_to_inches(panel.width);
    let panel_height_in = mm_to_inches(panel.height);
    let panel_width_mm = whole_mm(panel.width);
    let panel_height_mm = whole_mm(panel.height);

    Ok(format!(
        "Generate a flat packaging panel texture with the following specifications:

Panel: {face_name}
Dimensions: {panel_width_in:.2}\" × {panel_height_in:.2}\" ({panel_width_mm}mm × {panel_height_mm}mm)
Aspect Ratio: {aspect_ratio_lock} (MUST be exact)

CRITICAL REQUIREMENTS:
1. Create a flat, orthographic design (no perspective, shadows, or 3D effects)
2. The design MUST be exactly {aspect_ratio_lock} aspect ratio
3. Full-bleed: design extends to all edges with zero margin
4. No borders, frames, fold lines, or cut marks
5. Suitable for printing on packaging material
6. High-quality, print-ready artwork
7. The entire {panel_width_mm}mm × {panel_height_mm}mm area must be filled

SCALE AND COMPOSITION GUIDANCE:
{guidance}

VISUAL HARMONY:
- Scale patterns/elements to look balanced at {panel_width_mm}mm × {panel_height_mm}mm physical size
- Consider the {orientation} orientation when composing the design
- Ensure text (if any) is sized to be readable at the actual physical dimensions
- Make patterns/elements proportional to the panel's real-world scale
- Avoid elements that would look too small or too large on a {size} panel

USER REQUEST:
{user_prompt}

OUTPUT: Generate exactly ONE flat panel texture at {aspect_ratio_lock} aspect ratio, with composition and scale appropriate for a {size} {orientation} panel.
"
    ))
}

/// Short prompt for editing an existing panel texture.
pub fn build_iteration_prompt(
    face_name: &str,
    panel: PanelDimensions,
    user_prompt: &str,
) -> Result<String, PromptError> {
    validate_user_prompt(user_prompt)?;

    let aspect_ratio_lock = aspect_ratio(panel.width, panel.height);
    let panel_width_mm = whole_mm(panel.width);
    let panel_height_mm = whole_mm(panel.height);

    Ok(format!(
        "Modify the attached panel design according to the user's request.

Panel: {face_name}
Size: {panel_width_mm}mm × {panel_height_mm}mm
Aspect Ratio: {aspect_ratio_lock} (maintain exactly)

RULES:
- Keep the exact aspect ratio and dimensions
- Apply the user's requested changes to the reference image
- Maintain design continuity and quality
- Output flat, print-ready panel texture

USER REQUEST:
{user_prompt}"
    ))
}
