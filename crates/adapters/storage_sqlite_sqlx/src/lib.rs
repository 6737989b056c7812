//! # brewhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `StateStore` port defined in `brewhub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Store JSON documents keyed by namespace and id
//!
//! ## Dependency rule
//! Depends on `brewhub-app` (for port traits) and `brewhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod state_store;

pub use pool::{Config, Database};
pub use state_store::SqliteStateStore;
