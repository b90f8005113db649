//! fal.ai queue client running Trellis image-to-3D jobs for packsmith.
#![deny(unsafe_code)]
// `DefaultFalClient` is meant to be used through the core `ModelGenerator`
// port, not its generic backend structure
#![allow(private_interfaces)]

mod client;
mod config;
mod error;
mod http;
mod port;
mod queue;

pub use client::{DefaultFalClient, build_arguments};
pub use config::{FalConfig, TRELLIS_APP, TRELLIS_MULTI_APP};
pub use error::{FalError, FalResult};
pub use port::UnconfiguredFal;
pub use queue::{QueueState, StatusUpdate, running_progress};
