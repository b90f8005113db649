//! Repository implementations backed by `SQLite`.

mod sqlite_state_repository;

pub use sqlite_state_repository::SqliteStateRepository;
