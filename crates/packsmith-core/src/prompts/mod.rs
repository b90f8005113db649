//! Prompt construction for image generation.

pub mod panel;
pub mod product;

use thiserror::Error;

pub use panel::{
    aspect_ratio, build_iteration_prompt, build_master_prompt, build_simple_prompt, mm_to_inches,
    orientation, scale_guidance, size_description, validate_user_prompt,
};
pub use product::{
    masked_edit_prompt, mockup_create_prompt, mockup_edit_prompt, product_photo_prompt,
    reference_view_prompt, view_angle,
};

/// Rejections raised while building a prompt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PromptError {
    #[error("Prompt is too short. Please provide more detail about what you want.")]
    TooShort,

    #[error("Prompt is too long. Please keep it under {max} characters.")]
    TooLong { max: usize },

    #[error(
        "Prompt '{0}' is too vague. Please be more specific about:\n\
         - What style or theme you want\n\
         - What colors or patterns to use\n\
         - Any specific elements to include\n\
         Example: 'blue geometric pattern with white lines' or 'vintage cardboard texture'"
    )]
    TooVague(String),

    #[error("Invalid panel dimensions: {width}mm × {height}mm")]
    InvalidPanelDimensions { width: f64, height: f64 },
}
