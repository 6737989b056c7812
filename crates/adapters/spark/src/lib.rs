//! # brewhub-adapter-spark
//!
//! Client for the block API of a Spark controller service.
//!
//! ## Responsibilities
//! - Implement the `DeviceGateway` port defined in `brewhub-app::ports`
//! - Read and patch single blocks (`POST /{service}/blocks/read|patch`)
//! - Report readiness by pinging the service
//!
//! ## Dependency rule
//! Depends on `brewhub-app` (for port traits) and `brewhub-domain` (for domain types).

pub mod config;
pub mod error;
pub mod gateway;

pub use config::SparkConfig;
pub use error::SparkError;
pub use gateway::SparkGateway;
