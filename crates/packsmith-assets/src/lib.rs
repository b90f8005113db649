//! Memory + disk cache for generated binary assets.
//!
//! Models and textures are produced by remote services as URLs (or inline
//! `data:` URLs). [`AssetCache`] resolves them once and serves the bytes from
//! memory or disk afterwards.
#![deny(unsafe_code)]

mod cache;
mod error;
mod key;
mod memory;
mod source;

pub use cache::{AssetCache, DEFAULT_MEMORY_BYTES};
pub use error::{AssetError, AssetResult};
pub use key::{AssetKey, AssetKind, sanitize_id};
pub use source::{HttpBlobSource, sniff_content_type};
