//! # brewhub-app
//!
//! Application layer: the mash automation engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RecipeService`: batches, brewtrackers and recipes
//!   - `DeviceGateway`: read/patch the setpoint actuator
//!   - `StateStore`: durable key/value records
//!   - `EventPublisher`: best-effort notifications
//!   - `Scheduler`: cancellable deferred wake-ups
//! - Run the **mash engine**, the state machine driving a batch through its steps
//! - Provide **in-process infrastructure** that doesn't need IO: a tokio
//!   scheduler, the gateway liveness loop and the telemetry forwarder
//!
//! ## Dependency rule
//! Depends on `brewhub-domain` only (plus `tokio` for locks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod liveness;
pub mod mash_engine;
pub mod ports;
pub mod scheduler;
pub mod telemetry;

#[cfg(test)]
mod testing;
