//! # Shopfloor Communication
//!
//! Transport and protocol layers for the Shopfloor gateway:
//! - MQTT ingestion of machine status reports and command publishing
//! - FluidNC/Grbl wire-protocol formatting and parsing
//! - A direct, synchronous line channel to a single machine endpoint
//! - Best-effort cloud status reporting

pub mod communication;
pub mod firmware;

pub use communication::{
    cloud::{CloudConfig, CloudReporter},
    direct::{run_direct_command, DirectChannelConfig, DirectReply},
    dispatch::{CommandDispatcher, CommandIntent},
    mqtt::{MqttConfig, MqttLink},
    topics::{InboundTopic, ReportKind},
    ConnectionStatus,
};

pub use firmware::fluidnc;
