//! # brewhub-domain
//!
//! Pure domain model for the brewhub mash automation controller.
//!
//! ## Responsibilities
//! - Foundational types: error taxonomy, timestamps
//! - Define the **Step model** and its classification into execution policies
//! - Define the **Automation State** (stage/step cursors, mode, timer)
//! - Define **Settings** (which actuator is driven)
//! - Define **recipe data** (batches, brewtracker stages) and **device blocks**
//! - Define **Events** (transition notifications)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod device;
pub mod event;
pub mod recipe;
pub mod settings;
pub mod state;
pub mod step;
