//! crosspost domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Documents, platforms, publish results and run reports
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: The cross-post orchestrator and its helpers

pub mod model;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;
