//! # Shopfloor Core
//!
//! Core types, errors and the shared machine-state store for the Shopfloor
//! gateway. Provides the fundamental abstractions the transport and dispatch
//! layers build on: the per-machine record schema, the coarse-locked state
//! table with its update/consume protocol, and the unified error type.

pub mod error;
pub mod model;
pub mod store;

pub use error::{ConnectionError, Error, ProtocolError, Result};
pub use model::{Axis, MachineRecord, Position, MACHINE_SLOTS};
pub use store::{StateStore, UpdateTicket};
