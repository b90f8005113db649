//! Prompts for product photographs and whole-package mockups.

use crate::domain::{PackageDimensions, PackageType};

/// Camera angles for multi-view reconstruction, by view index.
const VIEW_ANGLES: [&str; 3] = [
    "front view at eye level, perfectly centered",
    "45-degree angle from upper right, showing top and right side",
    "side profile view from the left at eye level",
];

/// Camera angle for the `index`-th generated view.
pub fn view_angle(index: usize) -> &'static str {
    VIEW_ANGLES.get(index).copied().unwrap_or("alternate angle")
}

/// First view of a new product: text only, no reference.
pub fn product_photo_prompt(description: &str, view_index: usize) -> String {
    let angle = view_angle(view_index);
    format!(
        "Create a professional studio product photograph of {description}, \
         shot from a {angle}. \
         Photograph the product on a pure white background with professional studio lighting that creates \
         soft, subtle shadows. Use sharp focus to capture clear, well-defined edges. \
         Center the product in the frame and fill the frame while ensuring the entire product is visible - \
         nothing should be cropped or cut off. The design should be consistent and suitable for viewing \
         from multiple camera angles. Avoid any text overlays, watermarks, or distracting elements."
    )
}

/// A view rendered against a reference image of the same product.
pub fn reference_view_prompt(
    instruction: &str,
    base_description: Option<&str>,
    view_index: usize,
) -> String {
    let base = base_description
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("the existing product");
    let edit = match instruction.trim() {
        "" => "Apply the requested edit.",
        trimmed => trimmed,
    };
    let angle = view_angle(view_index);
    format!(
        "You are editing the exact same product shown in the reference image.\n\n\
         BASE PRODUCT: {base}\n\
         USER EDIT REQUEST: {edit}\n\n\
         Follow these rules strictly:\n\
         1. Keep the same product family, proportions, and materials unless the instruction explicitly \
         changes them. Every other detail must stay identical.\n\
         2. Interpret casual phrases like \"make it...\", \"color it...\", \"give it...\" as concrete, \
         visible edits. Exaggerate the requested change so it is obvious in a comparison.\n\
         3. Maintain the pure white studio background, matching lighting, lens, framing, and camera height.\n\
         4. Deliver a crisp studio photograph from {angle}. No extra props, text, or watermarks.\n"
    )
}

/// 3D mockup of a new package design.
pub fn mockup_create_prompt(
    package_type: PackageType,
    dims: &PackageDimensions,
    design_brief: &str,
) -> String {
    let PackageDimensions {
        width,
        height,
        depth,
    } = *dims;
    format!(
        "Generate a realistic 3D product photograph of a {package_type} package.

DESIGN BRIEF:
{design_brief}

SPECIFICATIONS:
- Package type: {package_type}
- Dimensions: {width}mm × {height}mm × {depth}mm

OUTPUT REQUIREMENTS:
- Show from a 3/4 angle view with multiple visible faces
- Display the complete design concept
- Professional product photography style
- Good lighting and shadows
- Clear, sharp, high-quality rendering

Generate a complete 3D mockup."
    )
}

/// 3D mockup of an existing package design with modifications applied.
pub fn mockup_edit_prompt(dims: &PackageDimensions, modifications: &str) -> String {
    let PackageDimensions {
        width,
        height,
        depth,
    } = *dims;
    format!(
        "Modify the package design shown in the reference image.

MODIFICATIONS REQUESTED:
{modifications}

OUTPUT REQUIREMENTS:
- Generate a 3D product photograph showing the modified design
- Show from a 3/4 angle view with multiple visible faces
- Apply the requested changes while maintaining package structure
- Professional product photography style with good lighting
- Dimensions: {width}mm × {height}mm × {depth}mm

Generate the modified 3D mockup."
    )
}

/// Instructions for a masked image edit.
pub fn masked_edit_prompt(instruction: &str) -> String {
    format!(
        "Edit the first image using the second image as a mask. \
         White areas of the mask mark the region to change; keep every other pixel identical. \
         Match the original lighting, perspective and style so the edit blends in.\n\n\
         EDIT REQUEST: {}",
        instruction.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angles_fall_back_after_three_views() {
        assert!(view_angle(0).starts_with("front view"));
        assert_eq!(view_angle(5), "alternate angle");
    }

    #[test]
    fn first_view_describes_product_and_angle() {
        let prompt = product_photo_prompt("a matte ceramic mug", 0);
        assert!(prompt.starts_with(
            "Create a professional studio product photograph of a matte ceramic mug, shot from a front view"
        ));
    }

    #[test]
    fn reference_view_defaults_base_and_instruction() {
        let prompt = reference_view_prompt("   ", None, 1);
        assert!(prompt.contains("BASE PRODUCT: the existing product\n"));
        assert!(prompt.contains("USER EDIT REQUEST: Apply the requested edit.\n"));
        assert!(prompt.contains("from 45-degree angle from upper right"));
    }

    #[test]
    fn mockup_prompts_include_dimensions() {
        let dims = PackageDimensions::new(100.0, 150.0, 60.5);
        let create = mockup_create_prompt(PackageType::Cylinder, &dims, "citrus labels");
        assert!(create.contains("of a cylinder package."));
        assert!(create.contains("Dimensions: 100mm × 150mm × 60.5mm"));

        let edit = mockup_edit_prompt(&dims, "swap to navy");
        assert!(edit.contains("MODIFICATIONS REQUESTED:\nswap to navy"));
    }
}
