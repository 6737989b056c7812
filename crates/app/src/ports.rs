//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the engine and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod device_gateway;
pub mod event_bus;
pub mod recipe_service;
pub mod scheduler;
pub mod state_store;

pub use device_gateway::DeviceGateway;
pub use event_bus::EventPublisher;
pub use recipe_service::RecipeService;
pub use scheduler::{ScheduledTask, Scheduler};
pub use state_store::StateStore;
