//! Domain types for product and packaging sessions.
//!
//! These are pure data types with no infrastructure dependencies.

pub mod packaging;
pub mod product;

pub use packaging::{
    PackageDimensions, PackageType, PackagingState, PackagingStatus, PanelDimensions,
    PanelTexture, ShapeState,
};
pub use product::{
    IterationKind, ProductIteration, ProductMode, ProductState, ProductStatus, TrellisArtifacts,
};
