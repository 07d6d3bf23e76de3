//! # Shopfloor Registry
//!
//! The persisted machine registry: which machine id lives at which control
//! endpoint. Loaded once at startup and saved on every edit, so an operator
//! can reach a machine's direct channel before it has announced an address
//! on the bus.

pub mod error;
pub mod manager;
pub mod model;

pub use error::{RegistryError, RegistryResult};
pub use manager::RegistryManager;
pub use model::MachineEntry;
