//! `SQLite` persistence for packsmith session documents.
#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

pub use factory::CoreFactory;
pub use repositories::SqliteStateRepository;
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;

// Linked for its bundled SQLite build only.
use libsqlite3_sys as _;
