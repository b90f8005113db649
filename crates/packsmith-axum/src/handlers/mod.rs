//! HTTP request handlers for the Axum web server.
//!
//! Each submodule contains handlers for a specific API area.
//! Handlers are thin wrappers that delegate to `AppCore`.

pub mod assets;
pub mod chat;
pub mod images;
pub mod packaging;
pub mod product;
pub mod system;
pub mod trellis;
