//! # Shopfloor
//!
//! A shop-floor gateway for a small fleet of FluidNC/Grbl CNC machines. It
//! aggregates live status reports arriving over MQTT into one shared state
//! table, drives consumers (status display, cloud reporter) from that table,
//! and dispatches operator commands back to a selected machine in the
//! controller's own line protocol.
//!
//! ## Architecture
//!
//! Shopfloor is organized as a workspace with multiple crates:
//!
//! 1. **shopfloor-core** - Errors, data model, the shared machine-state store
//! 2. **shopfloor-communication** - MQTT link, FluidNC codec, direct channel, cloud reporter
//! 3. **shopfloor-registry** - Persisted machine id to address registry
//! 4. **shopfloor** - Main binary that wires the tasks together

pub mod config;

pub use config::GatewayConfig;

pub use shopfloor_core::{
    Axis, ConnectionError, Error, MachineRecord, Position, ProtocolError, Result, StateStore,
    UpdateTicket, MACHINE_SLOTS,
};

pub use shopfloor_communication::{
    fluidnc, run_direct_command, CloudConfig, CloudReporter, CommandDispatcher, CommandIntent,
    ConnectionStatus, DirectChannelConfig, DirectReply, MqttConfig, MqttLink,
};

pub use shopfloor_registry::{MachineEntry, RegistryError, RegistryManager};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
