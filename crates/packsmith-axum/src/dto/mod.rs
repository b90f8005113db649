//! Request and response bodies of the HTTP API.
//!
//! Domain types that already serialise the way clients expect (states,
//! statuses, dielines) are returned directly; these cover the rest.

pub mod generation;
pub mod packaging;
pub mod product;

pub use generation::{ChatGenerateRequest, ImageEditRequest, ImageEditResponse};
pub use packaging::{
    BulkAccepted, DimensionsUpdated, GeometryQuery, PanelAccepted, ShapeReset, TextureDeleted,
    TexturePending, UpdateDimensionsRequest,
};
pub use product::{ProductCreateRequest, ProductEditRequest};
