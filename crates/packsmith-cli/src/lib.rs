//! `packsmith` command-line interface.
//!
//! `serve` runs the HTTP API; the other commands drive the same core
//! services directly against the configured database.
#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use parser::Cli;
