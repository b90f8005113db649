//! HTTP API for packsmith.
//!
//! Routes are thin: each handler validates its body, calls into
//! [`packsmith_core::AppCore`] and maps [`packsmith_core::CoreError`] to a
//! status code through [`HttpError`]. Long-running generations are spawned
//! onto the runtime and observed by polling the status routes.
#![deny(unsafe_code)]

pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, bootstrap, build_core, start_server};
pub use error::HttpError;
pub use extract::{ApiJson, ApiQuery};
pub use routes::create_router;
pub use state::AppState;
