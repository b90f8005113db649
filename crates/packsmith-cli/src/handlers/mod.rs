//! Command handlers.

pub mod dieline;
pub mod product;
pub mod serve;
pub mod status;
